use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;

use hulhe_cards::HandEvaluator;
use hulhe_core::CFRConfig;
use hulhe_store::InfoSetStore;
use hulhe_tree::{GameTree, NodeId, Player};

use crate::chance::{deal_hole_cards, ChanceProvider};
use crate::metrics::{ConvergenceMetrics, IterationSample};
use crate::stopping::{StopReason, StoppingController};
use crate::traverse::{traverse, TraversalContext};

/// Training progress snapshot, as returned by `get_training_stats`.
///
/// `exploitability` is the spec.md §6 field name; its value is the root
/// value-gap surrogate documented on [`IterationSample::value_gap`], not a
/// true best-response computation.
#[derive(Debug, Clone)]
pub struct TrainingStats {
    pub iterations: usize,
    pub elapsed: Duration,
    pub iterations_per_second: f64,
    pub infosets: usize,
    pub stopping_reason: Option<String>,
    pub exploitability: f64,
}

/// The single-threaded driver's mutable state across a training run
/// (spec.md §6's `state` argument to `train`/`get_current_strategy`).
pub struct SolverState {
    pub store: InfoSetStore,
    pub metrics: ConvergenceMetrics,
    pub iteration: usize,
    pub stop_reason: Option<StopReason>,
    started_at: Instant,
    /// Every touched infoset's current (regret-matched) strategy as of the
    /// previous iteration, used to measure strategy change iteration over
    /// iteration.
    prev_current_strategy: HashMap<String, Vec<f64>>,
}

impl SolverState {
    pub fn new() -> Self {
        Self {
            store: InfoSetStore::new(),
            metrics: ConvergenceMetrics::new(),
            iteration: 0,
            stop_reason: None,
            started_at: Instant::now(),
            prev_current_strategy: HashMap::new(),
        }
    }

    pub fn training_stats(&self) -> TrainingStats {
        let elapsed = self.started_at.elapsed();
        let exploitability = self
            .metrics
            .latest()
            .map(|s| s.value_gap)
            .unwrap_or(f64::INFINITY);
        TrainingStats {
            iterations: self.iteration,
            elapsed,
            iterations_per_second: if elapsed.as_secs_f64() > 0.0 {
                self.iteration as f64 / elapsed.as_secs_f64()
            } else {
                0.0
            },
            infosets: self.store.len(),
            stopping_reason: self.stop_reason.as_ref().map(ToString::to_string),
            exploitability,
        }
    }
}

impl Default for SolverState {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one paired iteration (spec.md §4.6: "one iteration runs two
/// traversals, alternating which player is the traverser"), dealing a
/// fresh hand each time.
fn run_one_iteration<R: Rng>(
    tree: &GameTree,
    evaluator: Option<&dyn HandEvaluator>,
    chance: &dyn ChanceProvider,
    config: CFRConfig,
    state: &mut SolverState,
    rng: &mut R,
) -> IterationSample {
    let start = Instant::now();
    let iteration = state.iteration + 1;
    let deal = deal_hole_cards(rng);

    let mut root_values = [0.0; 2];
    for &traverser in &[Player::P0, Player::P1] {
        let mut ctx = TraversalContext {
            store: &mut state.store,
            evaluator,
            chance,
            config,
            iteration,
            rng,
        };
        root_values[traverser.index()] =
            traverse(tree, tree.root().id, &deal, 1.0, 1.0, traverser, &mut ctx);
    }
    state.iteration = iteration;

    let value_gap = root_values[0].abs() + root_values[1].abs();
    let total_abs_regret: f64 = state
        .store
        .iter()
        .flat_map(|(_, rec)| rec.regrets.iter())
        .map(|r| r.abs())
        .sum();

    let (avg_strategy_change, max_strategy_change, strategy_entropy) =
        strategy_movement(&state.store, &mut state.prev_current_strategy, config.prune_threshold);

    IterationSample {
        value_gap,
        total_abs_regret,
        avg_strategy_change,
        max_strategy_change,
        strategy_entropy,
        infosets_visited: state.store.len(),
        elapsed: start.elapsed(),
    }
}

/// Average and maximum total-variation distance between each infoset's
/// current strategy this iteration and its current strategy last iteration
/// (spec.md §4.7), plus the mean Shannon entropy of every visited infoset's
/// average strategy. `snapshot` is replaced with this iteration's strategies
/// for next time; infosets with no prior snapshot (first visit) don't
/// contribute a change sample.
fn strategy_movement(
    store: &InfoSetStore,
    snapshot: &mut HashMap<String, Vec<f64>>,
    prune_threshold: Option<hulhe_core::Utility>,
) -> (f64, f64, f64) {
    let mut sum_change = 0.0;
    let mut max_change: f64 = 0.0;
    let mut changed = 0usize;
    let mut entropy_sum = 0.0;
    let mut visited = 0usize;
    let mut next = HashMap::with_capacity(store.len());

    for (id, record) in store.iter() {
        let current = record.current_strategy(prune_threshold);
        if let Some(prev) = snapshot.get(id) {
            let change: f64 = current.iter().zip(prev).map(|(c, p)| (c - p).abs()).sum::<f64>() / 2.0;
            sum_change += change;
            max_change = max_change.max(change);
            changed += 1;
        }
        let avg = record.average_strategy();
        entropy_sum += avg
            .iter()
            .filter(|&&p| p > 0.0)
            .map(|&p| -p * p.ln())
            .sum::<f64>();
        visited += 1;
        next.insert(id.clone(), current);
    }
    *snapshot = next;

    let avg_strategy_change = if changed > 0 { sum_change / changed as f64 } else { 0.0 };
    let strategy_entropy = if visited > 0 { entropy_sum / visited as f64 } else { 0.0 };
    (avg_strategy_change, max_change, strategy_entropy)
}

/// Train until a stop condition fires (spec.md §6's `train`). `iterations`,
/// when given, additionally caps the run independent of `config`.
pub fn train<R: Rng>(
    tree: &GameTree,
    state: &mut SolverState,
    config: CFRConfig,
    evaluator: Option<&dyn HandEvaluator>,
    chance: &dyn ChanceProvider,
    iterations: Option<usize>,
    rng: &mut R,
) -> StopReason {
    let controller = StoppingController::new(config);
    loop {
        let sample = run_one_iteration(tree, evaluator, chance, config, state, rng);
        state.metrics.record(sample);

        if hulhe_core::interrupted() {
            let reason = StopReason::Interrupted;
            state.stop_reason = Some(reason.clone());
            log::info!("training stopped: {reason}");
            return reason;
        }

        if let Some(cap) = iterations {
            if state.iteration >= cap {
                let reason = StopReason::MaxIterationsReached {
                    iterations: state.iteration,
                };
                state.stop_reason = Some(reason.clone());
                log::info!("training stopped: {reason}");
                return reason;
            }
        }

        if let Some(reason) = controller.should_stop(state.iteration, sample.value_gap) {
            state.stop_reason = Some(reason.clone());
            log::info!("training stopped: {reason}");
            return reason;
        }
    }
}

/// `get_current_strategy` (spec.md §6): regret-matched strategy at `node`'s
/// infoset, or `None` if the infoset has never been visited.
pub fn get_current_strategy(
    state: &SolverState,
    tree: &GameTree,
    node: NodeId,
    hole_token: Option<&str>,
    board_token: Option<&str>,
    prune_threshold: Option<hulhe_core::Utility>,
) -> Option<Vec<hulhe_core::Probability>> {
    let infoset_id = hulhe_store::canonical_infoset_id(tree.node(node), hole_token, board_token);
    state
        .store
        .get(&infoset_id)
        .map(|rec| rec.current_strategy(prune_threshold))
}

/// `get_average_strategy` (spec.md §6): the trained (approximately
/// equilibrium) strategy at `node`'s infoset.
pub fn get_average_strategy(
    state: &SolverState,
    tree: &GameTree,
    node: NodeId,
    hole_token: Option<&str>,
    board_token: Option<&str>,
) -> Option<Vec<hulhe_core::Probability>> {
    let infoset_id = hulhe_store::canonical_infoset_id(tree.node(node), hole_token, board_token);
    state.store.get(&infoset_id).map(|rec| rec.average_strategy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chance::FullDeckChance;
    use hulhe_core::GameParams;
    use hulhe_tree::build_game_tree;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn training_stops_within_max_iterations() {
        let tree = build_game_tree(GameParams::new(4, 1, 2, 4).unwrap(), true, false).unwrap();
        let mut config = CFRConfig::default();
        config.min_iterations = 0;
        config.max_iterations = 20;
        config.check_frequency = 1;
        config.target_exploitability = 0.0;
        let config = config.validated().unwrap();

        let mut state = SolverState::new();
        let chance = FullDeckChance;
        let mut rng = SmallRng::seed_from_u64(42);
        let reason = train(&tree, &mut state, config, None, &chance, None, &mut rng);
        assert!(matches!(reason, StopReason::MaxIterationsReached { .. }));
        assert!(state.iteration <= 20);
    }

    #[test]
    fn determinism_with_identical_seed() {
        let tree = build_game_tree(GameParams::new(4, 1, 2, 4).unwrap(), true, false).unwrap();
        let mut config = CFRConfig::default();
        config.min_iterations = 0;
        config.max_iterations = 20;
        config.check_frequency = 1;
        config.target_exploitability = 0.0;
        config.use_cfr_plus = true;
        let config = config.validated().unwrap();
        let chance = FullDeckChance;

        let mut state_a = SolverState::new();
        let mut rng_a = SmallRng::seed_from_u64(99);
        train(&tree, &mut state_a, config, None, &chance, None, &mut rng_a);

        let mut state_b = SolverState::new();
        let mut rng_b = SmallRng::seed_from_u64(99);
        train(&tree, &mut state_b, config, None, &chance, None, &mut rng_b);

        assert_eq!(state_a.store.len(), state_b.store.len());
        for (id, rec_a) in state_a.store.iter() {
            let rec_b = state_b.store.get(id).expect("same ids on same seed");
            for (a, b) in rec_a
                .average_strategy()
                .iter()
                .zip(rec_b.average_strategy())
            {
                assert!((a - b).abs() <= 1e-10);
            }
        }
    }
}
