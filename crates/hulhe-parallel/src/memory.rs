use std::collections::VecDeque;

use hulhe_tree::PruneStrategy;

const HISTORY_CAP: usize = 1_000;

/// Coarse memory-pressure classification (spec.md §4.9), ordered so
/// `Critical > Warning > Normal` for threshold comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MemoryPressure {
    Normal,
    Warning,
    Critical,
}

/// Byte thresholds at which [`MemoryMonitor::sample`] escalates pressure.
#[derive(Debug, Clone, Copy)]
pub struct MemoryThresholds {
    pub warning_bytes: usize,
    pub critical_bytes: usize,
}

impl Default for MemoryThresholds {
    fn default() -> Self {
        Self {
            warning_bytes: 1 << 30, // 1 GiB
            critical_bytes: 3 << 30, // 3 GiB
        }
    }
}

/// One point in the memory-usage history.
#[derive(Debug, Clone, Copy)]
pub struct MemorySample {
    pub infosets: usize,
    pub estimated_bytes: usize,
    pub pressure: MemoryPressure,
}

/// A record of an auto-prune triggered by sustained pressure.
#[derive(Debug, Clone)]
pub struct PruneEvent {
    pub iteration: usize,
    pub strategy: String,
    pub nodes_before: usize,
    pub nodes_after: usize,
}

/// Rough per-infoset footprint: two `Vec<Utility>` (regrets and
/// strategy-sum, `avg_actions` entries each) plus the owning `String` key
/// and `HashMap` bucket overhead.
pub fn estimate_bytes(num_infosets: usize, avg_actions: f64) -> usize {
    let vectors = (avg_actions * 2.0 * std::mem::size_of::<f64>() as f64) as usize;
    let overhead = 64; // key string + hashmap bucket, approximate
    num_infosets * (vectors + overhead)
}

fn classify(estimated_bytes: usize, thresholds: MemoryThresholds) -> MemoryPressure {
    if estimated_bytes >= thresholds.critical_bytes {
        MemoryPressure::Critical
    } else if estimated_bytes >= thresholds.warning_bytes {
        MemoryPressure::Warning
    } else {
        MemoryPressure::Normal
    }
}

/// Tracks estimated infoset-store memory over the course of a run and
/// decides when and how aggressively to auto-prune the betting tree
/// (spec.md §4.9: "the coordinator may shrink the tree under memory
/// pressure using the strategies from §4.3").
pub struct MemoryMonitor {
    thresholds: MemoryThresholds,
    avg_actions: f64,
    history: VecDeque<MemorySample>,
    prune_events: Vec<PruneEvent>,
}

impl MemoryMonitor {
    pub fn new(thresholds: MemoryThresholds, avg_actions: f64) -> Self {
        Self {
            thresholds,
            avg_actions,
            history: VecDeque::new(),
            prune_events: Vec::new(),
        }
    }

    /// Record one usage sample and return the pressure level it maps to.
    pub fn sample(&mut self, num_infosets: usize) -> MemoryPressure {
        let estimated_bytes = estimate_bytes(num_infosets, self.avg_actions);
        let pressure = classify(estimated_bytes, self.thresholds);
        if self.history.len() == HISTORY_CAP {
            self.history.pop_front();
        }
        self.history.push_back(MemorySample {
            infosets: num_infosets,
            estimated_bytes,
            pressure,
        });
        pressure
    }

    pub fn history(&self) -> &VecDeque<MemorySample> {
        &self.history
    }

    pub fn prune_events(&self) -> &[PruneEvent] {
        &self.prune_events
    }

    /// Pick a pruning strategy scaled to the current pressure level, or
    /// `None` if the tree should be left alone. `current_nodes` anchors
    /// the `Adaptive` target so a critical sample halves the tree rather
    /// than chasing a fixed absolute size.
    pub fn suggest_strategy(&self, pressure: MemoryPressure, current_nodes: usize) -> Option<PruneStrategy> {
        match pressure {
            MemoryPressure::Normal => None,
            MemoryPressure::Warning => Some(PruneStrategy::Importance { threshold: 0.05 }),
            MemoryPressure::Critical => Some(PruneStrategy::Adaptive {
                target: (current_nodes / 2).max(1),
                min_nodes_to_keep: 1,
            }),
        }
    }

    pub fn record_prune(&mut self, iteration: usize, strategy: PruneStrategy, nodes_before: usize, nodes_after: usize) {
        self.prune_events.push(PruneEvent {
            iteration,
            strategy: format!("{strategy:?}"),
            nodes_before,
            nodes_after,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_escalates_with_estimated_bytes() {
        let thresholds = MemoryThresholds {
            warning_bytes: 1_000,
            critical_bytes: 10_000,
        };
        assert_eq!(classify(500, thresholds), MemoryPressure::Normal);
        assert_eq!(classify(1_500, thresholds), MemoryPressure::Warning);
        assert_eq!(classify(20_000, thresholds), MemoryPressure::Critical);
    }

    #[test]
    fn sample_bounds_history_length() {
        let mut monitor = MemoryMonitor::new(MemoryThresholds::default(), 3.0);
        for n in 0..5 {
            monitor.sample(n);
        }
        assert_eq!(monitor.history().len(), 5);
    }

    #[test]
    fn critical_pressure_suggests_adaptive_halving() {
        let monitor = MemoryMonitor::new(MemoryThresholds::default(), 3.0);
        let strategy = monitor
            .suggest_strategy(MemoryPressure::Critical, 1000)
            .expect("critical pressure always suggests a strategy");
        match strategy {
            PruneStrategy::Adaptive { target, .. } => assert_eq!(target, 500),
            _ => panic!("expected Adaptive strategy"),
        }
    }

    #[test]
    fn normal_pressure_suggests_nothing() {
        let monitor = MemoryMonitor::new(MemoryThresholds::default(), 3.0);
        assert!(monitor.suggest_strategy(MemoryPressure::Normal, 1000).is_none());
    }
}
