use std::time::Duration;

/// Per-worker counters collected over one parallel training run (spec.md
/// §4.8's "per-thread statistics"), aggregated by [`aggregate`] into a
/// whole-run summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadStats {
    pub thread_id: usize,
    pub iterations_run: usize,
    pub nodes_visited: u64,
    pub busy_time: Duration,
}

/// A whole-run summary across every worker's [`ThreadStats`].
#[derive(Debug, Clone, Default)]
pub struct AggregateStats {
    pub workers: usize,
    pub total_iterations: usize,
    pub total_nodes_visited: u64,
    pub busiest_worker_time: Duration,
    pub idlest_worker_time: Duration,
}

/// Fold a batch of per-worker stats into one summary, used to report
/// load imbalance between workers at the end of a run.
pub fn aggregate(stats: &[ThreadStats]) -> AggregateStats {
    if stats.is_empty() {
        return AggregateStats::default();
    }
    let total_iterations = stats.iter().map(|s| s.iterations_run).sum();
    let total_nodes_visited = stats.iter().map(|s| s.nodes_visited).sum();
    let busiest_worker_time = stats.iter().map(|s| s.busy_time).max().unwrap_or_default();
    let idlest_worker_time = stats.iter().map(|s| s.busy_time).min().unwrap_or_default();
    AggregateStats {
        workers: stats.len(),
        total_iterations,
        total_nodes_visited,
        busiest_worker_time,
        idlest_worker_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_sums_iterations_and_tracks_extremes() {
        let stats = vec![
            ThreadStats {
                thread_id: 0,
                iterations_run: 10,
                nodes_visited: 100,
                busy_time: Duration::from_millis(50),
            },
            ThreadStats {
                thread_id: 1,
                iterations_run: 7,
                nodes_visited: 80,
                busy_time: Duration::from_millis(30),
            },
        ];
        let summary = aggregate(&stats);
        assert_eq!(summary.workers, 2);
        assert_eq!(summary.total_iterations, 17);
        assert_eq!(summary.total_nodes_visited, 180);
        assert_eq!(summary.busiest_worker_time, Duration::from_millis(50));
        assert_eq!(summary.idlest_worker_time, Duration::from_millis(30));
    }

    #[test]
    fn aggregate_of_empty_slice_is_default() {
        let summary = aggregate(&[]);
        assert_eq!(summary.workers, 0);
    }
}
