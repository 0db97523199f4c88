use std::time::{Duration, Instant};

use hulhe_core::{CFRConfig, Utility};

/// Why training stopped. Each variant's `Display` produces a
/// human-readable reason string surfaced to callers.
///
/// `TargetExploitabilityReached`'s `exploitability` is the root value-gap
/// surrogate (see `IterationSample::value_gap`), not a best-response
/// computation; the name matches spec.md §6/§8's `target_exploitability`
/// config field.
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    TargetExploitabilityReached { exploitability: Utility },
    TimeLimitReached { elapsed: Duration },
    MaxIterationsReached { iterations: usize },
    /// A cooperative-cancellation request (`hulhe_core::request_stop`, e.g.
    /// from Ctrl-C) was observed between iterations.
    Interrupted,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::TargetExploitabilityReached { exploitability } => write!(
                f,
                "target exploitability reached ({exploitability:.6} mbb/h)"
            ),
            StopReason::TimeLimitReached { elapsed } => {
                write!(f, "time limit reached ({:.1}s elapsed)", elapsed.as_secs_f64())
            }
            StopReason::MaxIterationsReached { iterations } => {
                write!(f, "maximum iterations reached ({iterations})")
            }
            StopReason::Interrupted => write!(f, "training interrupted"),
        }
    }
}

/// Drives when a training run ends. Owns no tree/store state;
/// `should_stop` is called by the single-threaded driver between iterations
/// with whatever exploitability estimate the caller has on hand.
#[derive(Debug)]
pub struct StoppingController {
    config: CFRConfig,
    started_at: Instant,
}

impl StoppingController {
    pub fn new(config: CFRConfig) -> Self {
        Self {
            config,
            started_at: Instant::now(),
        }
    }

    pub fn check_frequency(&self) -> usize {
        self.config.check_frequency
    }

    /// Evaluate stop conditions at iteration `iteration`, checked every
    /// `check_frequency` iterations and only after `min_iterations` have
    /// elapsed. Returns `None` to continue training. `exploitability` is
    /// whatever value-gap estimate the caller has on hand (see
    /// `IterationSample::value_gap`); the parameter name matches
    /// `CFRConfig::target_exploitability`, which it's compared against.
    pub fn should_stop(&self, iteration: usize, exploitability: Utility) -> Option<StopReason> {
        if iteration < self.config.min_iterations {
            return None;
        }
        if iteration % self.config.check_frequency != 0 && iteration != self.config.max_iterations
        {
            return None;
        }
        if exploitability <= self.config.target_exploitability {
            return Some(StopReason::TargetExploitabilityReached { exploitability });
        }
        let elapsed = self.started_at.elapsed();
        if elapsed >= Duration::from_secs(self.config.max_time_seconds) {
            return Some(StopReason::TimeLimitReached { elapsed });
        }
        if iteration >= self.config.max_iterations {
            return Some(StopReason::MaxIterationsReached {
                iterations: iteration,
            });
        }
        None
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(overrides: impl FnOnce(&mut CFRConfig)) -> CFRConfig {
        let mut cfg = CFRConfig::default();
        overrides(&mut cfg);
        cfg.validated().unwrap()
    }

    #[test]
    fn stops_early_on_target_exploitability() {
        let cfg = config(|c| {
            c.min_iterations = 10;
            c.max_iterations = 1000;
            c.check_frequency = 1;
            c.target_exploitability = 10.0;
        });
        let controller = StoppingController::new(cfg);
        assert!(controller.should_stop(5, 1.0).is_none());
        let reason = controller.should_stop(10, 1.0).unwrap();
        assert!(matches!(reason, StopReason::TargetExploitabilityReached { .. }));
    }

    #[test]
    fn stops_at_max_iterations() {
        let cfg = config(|c| {
            c.min_iterations = 0;
            c.max_iterations = 20;
            c.check_frequency = 1;
            c.target_exploitability = 0.0;
        });
        let controller = StoppingController::new(cfg);
        let reason = controller.should_stop(20, 1000.0).unwrap();
        assert!(matches!(reason, StopReason::MaxIterationsReached { .. }));
    }

    #[test]
    fn does_not_check_off_frequency_boundaries() {
        let cfg = config(|c| {
            c.min_iterations = 0;
            c.max_iterations = 1000;
            c.check_frequency = 10;
            c.target_exploitability = 10.0;
        });
        let controller = StoppingController::new(cfg);
        assert!(controller.should_stop(5, 1.0).is_none());
    }
}
