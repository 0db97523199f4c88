use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;

use hulhe_cards::HandEvaluator;
use hulhe_cards::HoleCards;
use hulhe_core::{CFRConfig, Probability, SamplingStrategy, Utility};
use hulhe_store::{canonical_infoset_id, InfoSetStore};
use hulhe_tree::{GameTree, NodeId, NodeKind, Player, TerminalKind};

use crate::chance::{ChanceProvider, Deal};

/// Everything [`traverse`] needs besides the tree and the current node:
/// the shared store, the external hand-evaluator and chance-outcome
/// providers, the active config, and the current iteration number.
///
/// `evaluator` is `None` for betting-structure-only training; showdown
/// terminals then keep their placeholder `(0, 0)` utilities instead of
/// being resolved against real cards.
pub struct TraversalContext<'a, R: Rng> {
    pub store: &'a mut InfoSetStore,
    pub evaluator: Option<&'a dyn HandEvaluator>,
    pub chance: &'a dyn ChanceProvider,
    pub config: CFRConfig,
    pub iteration: usize,
    pub rng: &'a mut R,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Enumerate,
    ChanceSample,
    External,
    Outcome,
}

fn mode_of(config: &CFRConfig) -> Mode {
    if !config.use_sampling {
        return Mode::Enumerate;
    }
    match config.sampling_strategy {
        SamplingStrategy::None => Mode::Enumerate,
        SamplingStrategy::Chance => Mode::ChanceSample,
        SamplingStrategy::External => Mode::External,
        SamplingStrategy::Outcome => Mode::Outcome,
    }
}

/// One CFR traversal: returns the expected utility for
/// `traverser` from `node_id` under the current strategy profile, updating
/// `ctx.store`'s regrets and strategy sums for every infoset owned by
/// `traverser` that this traversal visits.
pub fn traverse<R: Rng>(
    tree: &GameTree,
    node_id: NodeId,
    deal: &Deal,
    reach_trav: Probability,
    reach_opp: Probability,
    traverser: Player,
    ctx: &mut TraversalContext<R>,
) -> Utility {
    let node = tree.node(node_id);
    node.visit_count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    match node.kind {
        NodeKind::Terminal => terminal_utility(node, deal, traverser, ctx),
        NodeKind::Chance => {
            chance_utility(tree, node_id, deal, reach_trav, reach_opp, traverser, ctx)
        }
        NodeKind::Player => {
            player_utility(tree, node_id, deal, reach_trav, reach_opp, traverser, ctx)
        }
    }
}

fn terminal_utility<R: Rng>(
    node: &hulhe_tree::GameNode,
    deal: &Deal,
    traverser: Player,
    ctx: &TraversalContext<R>,
) -> Utility {
    let (u0, u1) = match node.terminal_kind {
        Some(TerminalKind::Fold) => node.utilities.expect("fold terminals always carry utilities"),
        Some(TerminalKind::Showdown) => showdown_utility(node, deal, ctx),
        None => (0.0, 0.0),
    };
    match traverser {
        Player::P0 => u0,
        Player::P1 => u1,
    }
}

fn showdown_utility<R: Rng>(
    node: &hulhe_tree::GameNode,
    deal: &Deal,
    ctx: &TraversalContext<R>,
) -> (f64, f64) {
    let Some(evaluator) = ctx.evaluator else {
        return (0.0, 0.0);
    };
    let board = deal.board.cards();
    let hole0 = &deal.hole[0];
    let hole1 = &deal.hole[1];
    assert_eq!(board.len(), 5, "showdown without a full board is a precondition violation");
    assert_eq!(hole0.len(), 2, "showdown without player 0's hole cards is a precondition violation");
    assert_eq!(hole1.len(), 2, "showdown without player 1's hole cards is a precondition violation");

    let seven0 = [board[0], board[1], board[2], board[3], board[4], hole0[0], hole0[1]];
    let seven1 = [board[0], board[1], board[2], board[3], board[4], hole1[0], hole1[1]];

    let rank0 = evaluator.eval(&seven0);
    let rank1 = evaluator.eval(&seven1);
    let invested = node.invested[0].min(node.invested[1]) as f64;
    use std::cmp::Ordering;
    match rank0.cmp(&rank1) {
        Ordering::Greater => (invested, -invested),
        Ordering::Less => (-invested, invested),
        Ordering::Equal => (0.0, 0.0),
    }
}

#[allow(clippy::too_many_arguments)]
fn chance_utility<R: Rng>(
    tree: &GameTree,
    node_id: NodeId,
    deal: &Deal,
    reach_trav: Probability,
    reach_opp: Probability,
    traverser: Player,
    ctx: &mut TraversalContext<R>,
) -> Utility {
    let node = tree.node(node_id);
    let child_id = node.children[0];
    let child_street = tree.node(child_id).street;
    let n_cards = child_street.n_revealed();
    let dead = deal.dead_cards();
    let outcomes = ctx.chance.outcomes(n_cards, &dead);
    if outcomes.is_empty() {
        return traverse(tree, child_id, deal, reach_trav, reach_opp, traverser, ctx);
    }

    match mode_of(&ctx.config) {
        Mode::Enumerate => {
            let mut total = 0.0;
            for outcome in &outcomes {
                let mut next_deal = deal.clone();
                next_deal.board.extend(outcome.cards.clone());
                total += outcome.prior
                    * traverse(
                        tree,
                        child_id,
                        &next_deal,
                        reach_trav,
                        reach_opp * outcome.prior,
                        traverser,
                        ctx,
                    );
            }
            total
        }
        Mode::ChanceSample => {
            let n = outcomes.len();
            let p = ctx.config.sampling_probability.clamp(1e-6, 1.0);
            let m = ((p * n as f64).ceil() as usize).clamp(1, n);
            let sampled = sample_without_replacement(&outcomes, m, ctx.rng);
            let mut total = 0.0;
            for outcome in &sampled {
                let mut next_deal = deal.clone();
                next_deal.board.extend(outcome.cards.clone());
                total += outcome.prior
                    * traverse(
                        tree,
                        child_id,
                        &next_deal,
                        reach_trav,
                        reach_opp * outcome.prior,
                        traverser,
                        ctx,
                    );
            }
            total * (n as f64 / m as f64)
        }
        Mode::External | Mode::Outcome => {
            let weights: Vec<f64> = outcomes.iter().map(|o| o.prior.max(1e-12)).collect();
            let idx = WeightedIndex::new(&weights)
                .expect("at least one chance outcome has positive prior")
                .sample(ctx.rng);
            let outcome = &outcomes[idx];
            let mut next_deal = deal.clone();
            next_deal.board.extend(outcome.cards.clone());
            traverse(
                tree,
                child_id,
                &next_deal,
                reach_trav,
                reach_opp * outcome.prior,
                traverser,
                ctx,
            )
        }
    }
}

// `Board::push` only accepts one card at a time; this tiny helper keeps the
// chance-outcome call sites above readable without a public multi-card API.
trait ExtendBoard {
    fn extend(&mut self, cards: Vec<hulhe_cards::Card>);
}
impl ExtendBoard for hulhe_cards::Board {
    fn extend(&mut self, cards: Vec<hulhe_cards::Card>) {
        for card in cards {
            self.push(card);
        }
    }
}

fn sample_without_replacement<R: Rng>(
    outcomes: &[crate::chance::ChanceOutcome],
    m: usize,
    rng: &mut R,
) -> Vec<crate::chance::ChanceOutcome> {
    let mut indices: Vec<usize> = (0..outcomes.len()).collect();
    let mut chosen = Vec::with_capacity(m);
    for _ in 0..m.min(indices.len()) {
        let i = rng.random_range(0..indices.len());
        chosen.push(outcomes[indices.remove(i)].clone());
    }
    chosen
}

#[allow(clippy::too_many_arguments)]
fn player_utility<R: Rng>(
    tree: &GameTree,
    node_id: NodeId,
    deal: &Deal,
    reach_trav: Probability,
    reach_opp: Probability,
    traverser: Player,
    ctx: &mut TraversalContext<R>,
) -> Utility {
    let node = tree.node(node_id);
    let actor = node.to_act.expect("player node always has a to_act seat");
    let k = node.children.len();

    let actor_hole = &deal.hole[actor.index()];
    let hole_str = match actor_hole.as_slice() {
        [a, b] => Some(HoleCards::new(*a, *b).canonical_token()),
        _ => None,
    };
    let board_str = deal.board.canonical_token();
    let infoset_id = canonical_infoset_id(node, hole_str.as_deref(), board_str.as_deref());

    let sigma = {
        let record = ctx.store.get_or_create(&infoset_id, k);
        record.current_strategy(ctx.config.prune_threshold)
    };

    let is_owner = actor == traverser;
    let mode = mode_of(&ctx.config);
    let opponent_sampled = mode == Mode::External && !is_owner;
    let fully_sample = mode == Mode::Outcome;

    if opponent_sampled || fully_sample {
        let idx = WeightedIndex::new(&sigma)
            .expect("regret matching always yields a valid distribution")
            .sample(ctx.rng);
        let (action, child_id) = node.action_to_child[idx];
        let _ = action;
        let next_reach_trav = if is_owner {
            reach_trav * sigma[idx]
        } else {
            reach_trav
        };
        let next_reach_opp = if is_owner {
            reach_opp
        } else {
            reach_opp * sigma[idx]
        };
        let v = traverse(tree, child_id, deal, next_reach_trav, next_reach_opp, traverser, ctx);

        if is_owner {
            // Single-sample outcome-sampling regret update. Every sampling
            // decision below this node (chance by its true prior, the
            // opponent and, recursively, the traverser's own later moves, by
            // their current regret-matched strategy) is on-policy, so `v` is
            // already an unbiased estimate of both this action's value and
            // the node's overall value. `w = v / sigma[idx]` turns that into
            // an unbiased per-action regret vector: only the sampled action
            // gets a nonzero term, scaled so its expectation over repeated
            // samples reproduces the exact enumeration-CFR regret for every
            // action (see DESIGN.md's outcome-sampling estimator entry).
            let w = v / sigma[idx].max(hulhe_core::PROBABILITY_FLOOR);
            let delta: Vec<Utility> = (0..k)
                .map(|a| {
                    let local = if a == idx { w } else { 0.0 };
                    reach_opp * (local - v)
                })
                .collect();
            let record = ctx.store.get_or_create(&infoset_id, k);
            record
                .update_regrets(&delta, ctx.iteration, ctx.config.use_cfr_plus)
                .expect("regret dimensions always match the infoset's action count");
            let weight = if ctx.config.use_linear_weighting {
                ctx.iteration as Utility
            } else {
                1.0
            };
            record
                .update_strategy_sum(&sigma, reach_trav, weight)
                .expect("strategy-sum dimensions always match the infoset's action count");
        }
        return v;
    }

    let mut action_utilities = vec![0.0; k];
    for (i, &(_, child_id)) in node.action_to_child.iter().enumerate() {
        let next_reach_trav = if is_owner {
            reach_trav * sigma[i]
        } else {
            reach_trav
        };
        let next_reach_opp = if is_owner {
            reach_opp
        } else {
            reach_opp * sigma[i]
        };
        action_utilities[i] = traverse(
            tree,
            child_id,
            deal,
            next_reach_trav,
            next_reach_opp,
            traverser,
            ctx,
        );
    }
    let node_value: Utility = sigma
        .iter()
        .zip(&action_utilities)
        .map(|(&s, &u)| s * u)
        .sum();

    if is_owner {
        let delta: Vec<Utility> = action_utilities
            .iter()
            .map(|&u| reach_opp * (u - node_value))
            .collect();
        let weight = if ctx.config.use_linear_weighting {
            ctx.iteration as Utility
        } else {
            1.0
        };
        let record = ctx.store.get_or_create(&infoset_id, k);
        record
            .update_regrets(&delta, ctx.iteration, ctx.config.use_cfr_plus)
            .expect("regret dimensions always match the infoset's action count");
        record
            .update_strategy_sum(&sigma, reach_trav, weight)
            .expect("strategy-sum dimensions always match the infoset's action count");
    }

    node_value
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
    fn single_traversal_updates_an_infoset_for_the_traverser() {
        let tree = build_game_tree(GameParams::new(4, 1, 2, 4).unwrap(), true, false).unwrap();
        let mut store = InfoSetStore::new();
        let chance = FullDeckChance;
        let mut rng = SmallRng::seed_from_u64(7);
        let mut ctx = TraversalContext {
            store: &mut store,
            evaluator: None,
            chance: &chance,
            config: CFRConfig::default(),
            iteration: 1,
            rng: &mut rng,
        };
        let deal = Deal::default();
        let value = traverse(&tree, tree.root().id, &deal, 1.0, 1.0, Player::P0, &mut ctx);
        assert!(value.is_finite());
        assert!(store.len() >= 1);
    }

    #[test]
    fn cfr_plus_keeps_all_regrets_nonnegative() {
        let tree = build_game_tree(GameParams::new(4, 1, 2, 4).unwrap(), true, false).unwrap();
        let mut store = InfoSetStore::new();
        let chance = FullDeckChance;
        let mut rng = SmallRng::seed_from_u64(3);
        let mut config = CFRConfig::default();
        config.use_cfr_plus = true;
        let mut ctx = TraversalContext {
            store: &mut store,
            evaluator: None,
            chance: &chance,
            config,
            iteration: 1,
            rng: &mut rng,
        };
        let deal = Deal::default();
        traverse(&tree, tree.root().id, &deal, 1.0, 1.0, Player::P0, &mut ctx);
        traverse(&tree, tree.root().id, &deal, 1.0, 1.0, Player::P1, &mut ctx);
        for (_, record) in store.iter() {
            assert!(record.regrets.iter().all(|&r| r >= 0.0));
        }
    }

    #[test]
    fn outcome_sampling_moves_regrets_away_from_zero() {
        let tree = build_game_tree(GameParams::new(4, 1, 2, 4).unwrap(), true, false).unwrap();
        let mut store = InfoSetStore::new();
        let chance = FullDeckChance;
        let mut rng = SmallRng::seed_from_u64(11);
        let mut config = CFRConfig::default();
        config.use_sampling = true;
        config.sampling_strategy = hulhe_core::SamplingStrategy::Outcome;
        let mut ctx = TraversalContext {
            store: &mut store,
            evaluator: None,
            chance: &chance,
            config,
            iteration: 1,
            rng: &mut rng,
        };
        let deal = Deal::default();
        for iteration in 1..=50 {
            ctx.iteration = iteration;
            traverse(&tree, tree.root().id, &deal, 1.0, 1.0, Player::P0, &mut ctx);
            traverse(&tree, tree.root().id, &deal, 1.0, 1.0, Player::P1, &mut ctx);
        }
        assert!(
            store.iter().any(|(_, record)| record.regrets.iter().any(|&r| r != 0.0)),
            "outcome sampling should move at least one infoset's regrets away from zero"
        );
    }
}
