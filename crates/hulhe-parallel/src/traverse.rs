use rand::Rng;

use hulhe_cards::{HandEvaluator, HoleCards};
use hulhe_cfr::{ChanceProvider, Deal};
use hulhe_core::{CFRConfig, Probability, Utility};
use hulhe_store::canonical_infoset_id;
use hulhe_tree::{GameTree, NodeId, NodeKind, Player, TerminalKind};

use crate::striped::StripedInfoSetStore;

/// The shared, read-mostly inputs one worker thread needs for a traversal;
/// everything mutable (the store) is reached through striped locks, so
/// this bundle can be shared across threads by reference.
pub struct ParallelContext<'a> {
    pub store: &'a StripedInfoSetStore,
    pub evaluator: Option<&'a (dyn HandEvaluator + Sync)>,
    pub chance: &'a (dyn ChanceProvider + Sync),
    pub config: CFRConfig,
    pub iteration: usize,
}

/// Full-enumeration CFR/CFR+/linear-weighted traversal against a
/// [`StripedInfoSetStore`] (spec.md §4.8: "Strategy-sum and regret
/// additions are commutative, so eventual results are independent of the
/// schedule up to floating-point associativity"). Sampling variants stay
/// on the single-threaded engine in `hulhe-cfr`; see DESIGN.md.
pub fn parallel_traverse<R: Rng>(
    tree: &GameTree,
    node_id: NodeId,
    deal: &Deal,
    reach_trav: Probability,
    reach_opp: Probability,
    traverser: Player,
    ctx: &ParallelContext,
    rng: &mut R,
) -> Utility {
    let node = tree.node(node_id);
    node.visit_count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    match node.kind {
        NodeKind::Terminal => terminal_utility(node, deal, traverser, ctx),
        NodeKind::Chance => chance_utility(tree, node_id, deal, reach_trav, reach_opp, traverser, ctx, rng),
        NodeKind::Player => player_utility(tree, node_id, deal, reach_trav, reach_opp, traverser, ctx, rng),
    }
}

fn terminal_utility(
    node: &hulhe_tree::GameNode,
    deal: &Deal,
    traverser: Player,
    ctx: &ParallelContext,
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

fn showdown_utility(node: &hulhe_tree::GameNode, deal: &Deal, ctx: &ParallelContext) -> (f64, f64) {
    let Some(evaluator) = ctx.evaluator else {
        return (0.0, 0.0);
    };
    let board = deal.board.cards();
    let hole0 = &deal.hole[0];
    let hole1 = &deal.hole[1];
    assert_eq!(board.len(), 5);
    assert_eq!(hole0.len(), 2);
    assert_eq!(hole1.len(), 2);
    let seven0 = [board[0], board[1], board[2], board[3], board[4], hole0[0], hole0[1]];
    let seven1 = [board[0], board[1], board[2], board[3], board[4], hole1[0], hole1[1]];
    let invested = node.invested[0].min(node.invested[1]) as f64;
    use std::cmp::Ordering;
    match evaluator.eval(&seven0).cmp(&evaluator.eval(&seven1)) {
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
    ctx: &ParallelContext,
    rng: &mut R,
) -> Utility {
    let node = tree.node(node_id);
    let child_id = node.children[0];
    let child_street = tree.node(child_id).street;
    let dead = deal.dead_cards();
    let outcomes = ctx.chance.outcomes(child_street.n_revealed(), &dead);
    if outcomes.is_empty() {
        return parallel_traverse(tree, child_id, deal, reach_trav, reach_opp, traverser, ctx, rng);
    }
    let mut total = 0.0;
    for outcome in &outcomes {
        let mut next_deal = deal.clone();
        for &card in &outcome.cards {
            next_deal.board.push(card);
        }
        total += outcome.prior
            * parallel_traverse(
                tree,
                child_id,
                &next_deal,
                reach_trav,
                reach_opp * outcome.prior,
                traverser,
                ctx,
                rng,
            );
    }
    total
}

#[allow(clippy::too_many_arguments)]
fn player_utility<R: Rng>(
    tree: &GameTree,
    node_id: NodeId,
    deal: &Deal,
    reach_trav: Probability,
    reach_opp: Probability,
    traverser: Player,
    ctx: &ParallelContext,
    rng: &mut R,
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

    let sigma =
        ctx.store
            .with_record(&infoset_id, k, |rec| rec.current_strategy(ctx.config.prune_threshold));

    let is_owner = actor == traverser;
    let mut action_utilities = vec![0.0; k];
    for (i, &(_, child_id)) in node.action_to_child.iter().enumerate() {
        let next_reach_trav = if is_owner { reach_trav * sigma[i] } else { reach_trav };
        let next_reach_opp = if is_owner { reach_opp } else { reach_opp * sigma[i] };
        action_utilities[i] = parallel_traverse(
            tree,
            child_id,
            deal,
            next_reach_trav,
            next_reach_opp,
            traverser,
            ctx,
            rng,
        );
    }
    let node_value: Utility = sigma.iter().zip(&action_utilities).map(|(&s, &u)| s * u).sum();

    if is_owner {
        let delta: Vec<Utility> = action_utilities.iter().map(|&u| reach_opp * (u - node_value)).collect();
        let weight = if ctx.config.use_linear_weighting {
            ctx.iteration as Utility
        } else {
            1.0
        };
        ctx.store.with_record(&infoset_id, k, |rec| {
            rec.update_regrets(&delta, ctx.iteration, ctx.config.use_cfr_plus)
                .expect("regret dimensions always match the infoset's action count");
            rec.update_strategy_sum(&sigma, reach_trav, weight)
                .expect("strategy-sum dimensions always match the infoset's action count");
        });
    }

    node_value
}

#[cfg(test)]
mod tests {
    use super::*;
    use hulhe_cfr::{deal_hole_cards, FullDeckChance};
    use hulhe_core::GameParams;
    use hulhe_tree::build_game_tree;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn parallel_traversal_updates_the_striped_store() {
        let tree = build_game_tree(GameParams::new(4, 1, 2, 4).unwrap(), true, false).unwrap();
        let store = StripedInfoSetStore::new(16);
        let chance = FullDeckChance;
        let mut rng = SmallRng::seed_from_u64(11);
        let deal = deal_hole_cards(&mut rng);
        let ctx = ParallelContext {
            store: &store,
            evaluator: None,
            chance: &chance,
            config: CFRConfig::default(),
            iteration: 1,
        };
        let value = parallel_traverse(&tree, tree.root().id, &deal, 1.0, 1.0, Player::P0, &ctx, &mut rng);
        assert!(value.is_finite());
        assert!(store.len() >= 1);
    }
}
