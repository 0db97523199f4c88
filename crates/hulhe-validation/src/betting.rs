//! The third reference fixture: HU-LHE reduced to a preflop-only,
//! tiny-stack instance (stack=4, SB=1, BB=2, cap=4). Unlike [`crate::rps`]
//! and [`crate::kuhn`], this fixture drives the real `hulhe-tree` builder
//! and `hulhe_cfr::traverse` directly (not the convenience `train` driver)
//! against a card-free deal, so it doubles as a smoke test for the
//! production traversal code.
//!
//! With `evaluator: None`, every showdown ties at `(0, 0)`, which makes
//! folding strictly dominated by continuing (continuing can only return
//! what showdown gives, 0, while folding forfeits the folder's own sunk
//! investment) at every decision in this zero-sum, complete-information
//! betting game. Backward induction therefore gives a closed-form root
//! value of exactly `0.0` to both players, the same way `rps`'s and
//! `kuhn`'s closed-form values are derived — this fixture's
//! `observed_value` is the post-training root value under the trained
//! average strategies, not a static tree-builder fact, so it genuinely
//! exercises convergence like the other two.

use hulhe_cfr::{traverse, Deal, FullDeckChance, TraversalContext};
use hulhe_core::{CFRConfig, GameParams};
use hulhe_store::{InfoSetStore, TreeIndex};
use hulhe_tree::{build_game_tree, GameTree, NodeId, NodeKind, Player, TerminalKind};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::FixtureResult;

const ITERATIONS: usize = 4_000;

/// Exact value to player 0 of `node_id`, under the average strategies
/// accumulated in `store`. Walks the already-built [`GameTree`] instead of
/// re-deriving game structure the way [`crate::kuhn::average_value`] does
/// for its hand-rolled recursion, since the betting tree already encodes
/// it; unvisited infosets fall back to a uniform strategy, same as an
/// untrained `CFRInfoSet`'s regret-matched strategy would.
///
/// Looks player nodes up through `index` rather than recomputing
/// `canonical_infoset_id` at every call: this fixture's tree is card-free
/// and preflop-only, so one `hole_token: None, board_token: None` index
/// built up front answers for every node, exactly the case `TreeIndex`'s
/// own doc comment describes (see DESIGN.md for why the per-deal training
/// loop above can't share this shortcut).
fn average_value_to_p0(tree: &GameTree, store: &InfoSetStore, index: &TreeIndex, node_id: NodeId) -> f64 {
    let node = tree.node(node_id);
    match node.kind {
        NodeKind::Terminal => match node.terminal_kind {
            Some(TerminalKind::Fold) => {
                node.utilities.expect("fold terminals carry utilities unconditionally").0
            }
            Some(TerminalKind::Showdown) | None => 0.0,
        },
        NodeKind::Chance => average_value_to_p0(tree, store, index, node.children[0]),
        NodeKind::Player => {
            let id = index.infoset_of(node_id).expect("every player node is indexed");
            let k = node.children.len();
            let strategy = store
                .get(id)
                .map(|rec| rec.average_strategy())
                .unwrap_or_else(|| vec![1.0 / k as f64; k]);
            node.children
                .iter()
                .zip(&strategy)
                .map(|(&child, &p)| p * average_value_to_p0(tree, store, index, child))
                .sum()
        }
    }
}

/// Build the tiny preflop-only tree, run `ITERATIONS` paired traversals
/// against a card-free deal (so every infoset collapses to one per
/// (player, street, history), independent of cards), and report the root's
/// average-strategy value to player 0 against its closed-form equilibrium
/// value of `0.0`.
pub fn run() -> FixtureResult {
    let params = GameParams::new(4, 1, 2, 4).expect("scenario 1 params are valid");
    let tree = build_game_tree(params, true, false).expect("preflop-only tree must build");

    let mut store = InfoSetStore::new();
    let chance = FullDeckChance;
    let mut rng = SmallRng::seed_from_u64(2024);
    let deal = Deal::default();
    let config = CFRConfig::default().validated().expect("default config is valid");

    for iteration in 1..=ITERATIONS {
        for &traverser in &[Player::P0, Player::P1] {
            let mut ctx = TraversalContext {
                store: &mut store,
                evaluator: None,
                chance: &chance,
                config,
                iteration,
                rng: &mut rng,
            };
            traverse(&tree, tree.root().id, &deal, 1.0, 1.0, traverser, &mut ctx);
        }
    }

    let index = TreeIndex::build(&tree, None, None);
    let observed_value = average_value_to_p0(&tree, &store, &index, tree.root().id);

    FixtureResult {
        name: "hu-lhe-preflop-only",
        observed_value,
        expected_value: 0.0,
        tolerance: 0.05,
        infosets: store.len(),
    }
}

/// Sanity check that the preflop betting tree has a plausible number of
/// complete sequences (15 to 35, by hand-enumeration of the fixed-limit
/// cap=4 betting tree), expressed as terminal-plus-root leaves since every
/// enumerated `BetSequence` corresponds 1:1 to a tree leaf.
pub fn sequence_count_in_range() -> bool {
    let params = GameParams::new(4, 1, 2, 4).unwrap();
    let tree = build_game_tree(params, true, false).unwrap();
    let count = tree.terminal_nodes.len();
    (15..=35).contains(&count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sb_fold_terminal_carries_the_known_utility() {
        let tree = build_game_tree(GameParams::new(4, 1, 2, 4).unwrap(), true, false).unwrap();
        let fold_node = tree
            .terminal_nodes
            .iter()
            .map(|&id| tree.node(id))
            .find(|n| n.history == "f")
            .expect("an immediate SB-fold terminal must exist");
        let (u0, u1) = fold_node.utilities.expect("fold terminals carry utilities unconditionally");
        assert_eq!((u0, u1), (-1.0, 1.0));
    }

    #[test]
    fn trained_root_value_converges_towards_the_closed_form_value() {
        let result = run();
        assert!(
            result.passed(),
            "observed {} not within tolerance of the closed-form value {}",
            result.observed_value,
            result.expected_value
        );
    }

    #[test]
    fn sequence_count_falls_in_the_declared_range() {
        assert!(sequence_count_in_range());
    }

    #[test]
    fn training_populates_a_nonempty_store() {
        let result = run();
        assert!(result.infosets > 0);
    }
}
