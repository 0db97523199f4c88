use hulhe_core::{Probability, Utility};

use crate::error::StoreError;

/// Per-infoset CFR record: regret vector, strategy-sum vector, and the
/// iteration it was last touched.
#[derive(Debug, Clone)]
pub struct CFRInfoSet {
    pub regrets: Vec<Utility>,
    pub strategy_sum: Vec<Utility>,
    pub last_iteration: usize,
}

impl CFRInfoSet {
    pub fn new(num_actions: usize) -> Self {
        Self {
            regrets: vec![0.0; num_actions],
            strategy_sum: vec![0.0; num_actions],
            last_iteration: 0,
        }
    }

    pub fn num_actions(&self) -> usize {
        self.regrets.len()
    }

    /// Regret matching: `r⁺ = max(r, 0)`; if `Σr⁺ > 0`
    /// return `r⁺ / Σr⁺`, else uniform. `prune_threshold`, when set,
    /// excludes action i from the support by flooring its matched weight
    /// to zero whenever `regrets[i]` falls below the threshold.
    pub fn current_strategy(&self, prune_threshold: Option<Utility>) -> Vec<Probability> {
        let k = self.num_actions();
        if k == 1 {
            return vec![1.0];
        }
        let positive: Vec<Utility> = self
            .regrets
            .iter()
            .map(|&r| {
                if let Some(threshold) = prune_threshold {
                    if r < threshold {
                        return 0.0;
                    }
                }
                r.max(0.0)
            })
            .collect();
        let sum: Utility = positive.iter().sum();
        if sum > 0.0 {
            positive.iter().map(|&r| r / sum).collect()
        } else {
            vec![1.0 / k as Probability; k]
        }
    }

    /// Average strategy: `s / Σs`, uniform when never accumulated (a
    /// never-visited infoset's average strategy is uniform).
    pub fn average_strategy(&self) -> Vec<Probability> {
        let k = self.num_actions();
        let sum: Utility = self.strategy_sum.iter().sum();
        if sum > 0.0 {
            self.strategy_sum.iter().map(|&s| s / sum).collect()
        } else {
            vec![1.0 / k as Probability; k]
        }
    }

    /// `rec.r ← rec.r + Δ`; under CFR+ clamp componentwise to `≥ 0`.
    pub fn update_regrets(
        &mut self,
        delta: &[Utility],
        iteration: usize,
        cfr_plus: bool,
    ) -> Result<(), StoreError> {
        self.check_dimension(delta.len())?;
        for (r, &d) in self.regrets.iter_mut().zip(delta) {
            *r += d;
            if cfr_plus {
                *r = r.max(0.0);
            } else {
                *r = r.max(hulhe_core::REGRET_MIN);
            }
        }
        self.last_iteration = iteration;
        Ok(())
    }

    /// `rec.s ← rec.s + weight · reach · π`.
    pub fn update_strategy_sum(
        &mut self,
        strategy: &[Probability],
        reach: Probability,
        weight: Utility,
    ) -> Result<(), StoreError> {
        self.check_dimension(strategy.len())?;
        for (s, &pi) in self.strategy_sum.iter_mut().zip(strategy) {
            *s += weight * reach * pi;
        }
        Ok(())
    }

    pub fn reset_regrets(&mut self) {
        self.regrets.iter_mut().for_each(|r| *r = 0.0);
    }

    pub fn reset_strategy_sum(&mut self) {
        self.strategy_sum.iter_mut().for_each(|s| *s = 0.0);
    }

    fn check_dimension(&self, got: usize) -> Result<(), StoreError> {
        if got != self.num_actions() {
            return Err(StoreError::DimensionMismatch {
                id_len: 0,
                expected: self.num_actions(),
                got,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_action_infoset_is_always_certain() {
        let info = CFRInfoSet::new(1);
        assert_eq!(info.current_strategy(None), vec![1.0]);
        assert_eq!(info.average_strategy(), vec![1.0]);
    }

    #[test]
    fn never_visited_infoset_is_uniform() {
        let info = CFRInfoSet::new(3);
        let avg = info.average_strategy();
        assert!(avg.iter().all(|&p| (p - 1.0 / 3.0).abs() < 1e-12));
    }

    #[test]
    fn negative_regrets_fall_back_to_uniform() {
        let mut info = CFRInfoSet::new(2);
        info.update_regrets(&[-5.0, -3.0], 1, false).unwrap();
        let strategy = info.current_strategy(None);
        assert!((strategy[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn cfr_plus_clamps_regrets_to_nonnegative() {
        let mut info = CFRInfoSet::new(2);
        info.update_regrets(&[-5.0, 3.0], 1, true).unwrap();
        assert!(info.regrets.iter().all(|&r| r >= 0.0));
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let mut info = CFRInfoSet::new(2);
        assert!(info.update_regrets(&[1.0], 1, true).is_err());
    }
}
