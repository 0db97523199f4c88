//! Rock-Paper-Scissors: the simplest possible validation fixture.
//!
//! Modeled as two single-shot decisions sharing no sequential structure:
//! player 0's infoset and player 1's infoset (player 1 never observes
//! player 0's choice, so all three of player 0's continuations collapse
//! into the same infoset for player 1 — the textbook way of encoding
//! simultaneous moves in a sequential-game formalism). Both players are
//! trained directly against the payoff matrix with vanilla regret
//! matching from [`hulhe_store::CFRInfoSet`], with no tree or chance node
//! involved.

use hulhe_store::CFRInfoSet;

use crate::FixtureResult;

const NUM_ACTIONS: usize = 3;

/// Player 0's payoff for playing `a` against player 1's `b`; +1 win, -1
/// loss, 0 tie. `(a + 3 - b) % 3 == 1` iff `a` beats `b` (rock beats
/// scissors, paper beats rock, scissors beats paper).
fn payoff0(a: usize, b: usize) -> f64 {
    if a == b {
        0.0
    } else if (a + 3 - b) % 3 == 1 {
        1.0
    } else {
        -1.0
    }
}

/// Train both single infosets for `iterations` rounds of vanilla CFR
/// (regret matching, strategy-sum accumulation), then
/// report player 0's expected value under the average strategies. The
/// Nash equilibrium is uniform 1/3 per action for both players with game
/// value 0.
pub fn run(iterations: usize) -> FixtureResult {
    let mut p0 = CFRInfoSet::new(NUM_ACTIONS);
    let mut p1 = CFRInfoSet::new(NUM_ACTIONS);

    for t in 1..=iterations.max(1) {
        let sigma0 = p0.current_strategy(None);
        let sigma1 = p1.current_strategy(None);

        let util0: Vec<f64> = (0..NUM_ACTIONS)
            .map(|a| (0..NUM_ACTIONS).map(|b| sigma1[b] * payoff0(a, b)).sum())
            .collect();
        let node_util0: f64 = (0..NUM_ACTIONS).map(|a| sigma0[a] * util0[a]).sum();
        let delta0: Vec<f64> = util0.iter().map(|&u| u - node_util0).collect();
        p0.update_regrets(&delta0, t, false).expect("dimensions match");
        p0.update_strategy_sum(&sigma0, 1.0, 1.0).expect("dimensions match");

        // player 1's payoff is the transpose negation of player 0's.
        let util1: Vec<f64> = (0..NUM_ACTIONS)
            .map(|b| (0..NUM_ACTIONS).map(|a| sigma0[a] * -payoff0(a, b)).sum())
            .collect();
        let node_util1: f64 = (0..NUM_ACTIONS).map(|b| sigma1[b] * util1[b]).sum();
        let delta1: Vec<f64> = util1.iter().map(|&u| u - node_util1).collect();
        p1.update_regrets(&delta1, t, false).expect("dimensions match");
        p1.update_strategy_sum(&sigma1, 1.0, 1.0).expect("dimensions match");
    }

    let avg0 = p0.average_strategy();
    let avg1 = p1.average_strategy();
    let observed_value: f64 = (0..NUM_ACTIONS)
        .map(|a| (0..NUM_ACTIONS).map(|b| avg0[a] * avg1[b] * payoff0(a, b)).sum::<f64>())
        .sum();

    FixtureResult {
        name: "rock-paper-scissors",
        observed_value,
        expected_value: 0.0,
        tolerance: 0.02,
        infosets: 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_to_the_zero_sum_value() {
        let result = run(5_000);
        assert!(result.passed(), "observed {} not within tolerance of 0", result.observed_value);
    }

    #[test]
    fn average_strategies_converge_to_uniform() {
        let mut p0 = CFRInfoSet::new(NUM_ACTIONS);
        let mut p1 = CFRInfoSet::new(NUM_ACTIONS);
        for t in 1..=5_000usize {
            let sigma0 = p0.current_strategy(None);
            let sigma1 = p1.current_strategy(None);
            let util0: Vec<f64> = (0..NUM_ACTIONS)
                .map(|a| (0..NUM_ACTIONS).map(|b| sigma1[b] * payoff0(a, b)).sum())
                .collect();
            let node_util0: f64 = (0..NUM_ACTIONS).map(|a| sigma0[a] * util0[a]).sum();
            let delta0: Vec<f64> = util0.iter().map(|&u| u - node_util0).collect();
            p0.update_regrets(&delta0, t, false).unwrap();
            p0.update_strategy_sum(&sigma0, 1.0, 1.0).unwrap();

            let util1: Vec<f64> = (0..NUM_ACTIONS)
                .map(|b| (0..NUM_ACTIONS).map(|a| sigma0[a] * -payoff0(a, b)).sum())
                .collect();
            let node_util1: f64 = (0..NUM_ACTIONS).map(|b| sigma1[b] * util1[b]).sum();
            let delta1: Vec<f64> = util1.iter().map(|&u| u - node_util1).collect();
            p1.update_regrets(&delta1, t, false).unwrap();
            p1.update_strategy_sum(&sigma1, 1.0, 1.0).unwrap();
        }
        for &p in p0.average_strategy().iter() {
            assert!((p - 1.0 / 3.0).abs() < 0.03);
        }
    }

    #[test]
    fn payoff_matrix_is_antisymmetric_zero_sum() {
        for a in 0..NUM_ACTIONS {
            for b in 0..NUM_ACTIONS {
                assert_eq!(payoff0(a, b), -payoff0(b, a));
            }
        }
    }
}
