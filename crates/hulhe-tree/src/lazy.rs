use std::collections::HashSet;

use hulhe_core::Chips;

use crate::node::NodeId;
use crate::sequence::enumerate_sequences;
use crate::tree::GameTree;

/// Wraps a [`GameTree`] that was built with expansion stopped at
/// `max_depth` (spec.md §4.3's "Lazy Tree"): nodes at the frontier are
/// marked here so `expand_node` knows where unfolding can still continue.
#[derive(Debug, Clone)]
pub struct LazyTree {
    pub tree: GameTree,
    pub max_depth: usize,
    expanded: HashSet<NodeId>,
}

fn depth_of(tree: &GameTree, mut id: NodeId) -> usize {
    let mut depth = 0;
    while let Some(parent) = tree.node(id).parent {
        depth += 1;
        id = parent;
    }
    depth
}

impl LazyTree {
    pub fn new(tree: GameTree, max_depth: usize) -> Self {
        let expanded: HashSet<NodeId> = tree
            .nodes
            .iter()
            .filter(|n| !n.children.is_empty())
            .map(|n| n.id)
            .collect();
        Self {
            tree,
            max_depth,
            expanded,
        }
    }

    pub fn is_frontier(&self, id: NodeId) -> bool {
        let node = self.tree.node(id);
        node.is_player() && node.children.is_empty() && depth_of(&self.tree, id) < self.max_depth
    }

    /// Expand `node` one betting round deeper from the already-enumerated
    /// sequence step, per spec.md §4.3's `expand_node!(n)`. Idempotent: a
    /// node already expanded is a no-op (spec.md: "re-expanding an
    /// already-expanded node is a no-op").
    pub fn expand_node(&mut self, id: NodeId) {
        if self.expanded.contains(&id) {
            return;
        }
        let node = self.tree.node(id).clone();
        if !node.is_player() {
            self.expanded.insert(id);
            return;
        }

        let bet_size =
            self.tree.params.small_blind * node.street.bet_size_multiplier() as Chips;
        let to_act = node.to_act.expect("player node always has a to_act seat");
        let sequences = enumerate_sequences(
            node.invested,
            node.facing_bet,
            node.raises_this_street,
            to_act,
            self.tree.params.max_raises_per_street,
            bet_size,
            false,
            0,
        );

        // One-ply expansion: only the sequences' first action becomes a
        // real child here; deeper plies stay frontier nodes until their
        // own `expand_node` call.
        let mut seen_actions = HashSet::new();
        for sequence in &sequences {
            let Some(&first_action) = sequence.actions.first() else {
                continue;
            };
            if !seen_actions.insert(first_action) {
                continue;
            }
            let child_id = self.tree.nodes.len() as NodeId;
            let mut invested = node.invested;
            let cost = match crate::action::resolve_action(
                first_action,
                node.facing_bet,
                node.raises_this_street,
                false,
                bet_size,
                0,
            ) {
                crate::action::ActionOutcome::Fold => 0,
                crate::action::ActionOutcome::Continue { cost, .. } => cost,
                crate::action::ActionOutcome::ClosesStreet { cost } => cost,
            };
            invested[to_act.index()] += cost;

            let mut history = node.history.clone();
            history.push(first_action.history_char());

            let (kind, to_act_next, terminal_kind, utilities) = match first_action {
                crate::action::Action::Fold => (
                    crate::node::NodeKind::Terminal,
                    None,
                    Some(crate::node::TerminalKind::Fold),
                    Some(if to_act == crate::node::Player::P0 {
                        (-(invested[0] as f64), invested[0] as f64)
                    } else {
                        (invested[1] as f64, -(invested[1] as f64))
                    }),
                ),
                _ => (
                    crate::node::NodeKind::Player,
                    Some(to_act.opponent()),
                    None,
                    None,
                ),
            };

            self.tree.nodes.push(crate::node::GameNode {
                id: child_id,
                kind,
                to_act: to_act_next,
                street: node.street,
                invested,
                raises_this_street: if first_action == crate::action::Action::Raise {
                    node.raises_this_street + 1
                } else {
                    node.raises_this_street
                },
                facing_bet: first_action == crate::action::Action::Raise,
                history,
                parent: Some(id),
                action_to_child: Vec::new(),
                children: Vec::new(),
                terminal_kind,
                utilities,
                visit_count: std::sync::atomic::AtomicU64::new(0),
            });
            self.tree.nodes[id as usize]
                .action_to_child
                .push((first_action, child_id));
            self.tree.nodes[id as usize].children.push(child_id);
            match kind {
                crate::node::NodeKind::Terminal => self.tree.terminal_nodes.push(child_id),
                crate::node::NodeKind::Player => self.tree.player_nodes.push(child_id),
                crate::node::NodeKind::Chance => {}
            }
        }
        self.expanded.insert(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::build_game_tree;
    use hulhe_core::GameParams;

    #[test]
    fn frontier_node_is_childless_until_expanded() {
        let params = GameParams::new(4, 1, 2, 4).unwrap();
        let root_only = build_game_tree(params, true, false).unwrap();
        let mut lazy = LazyTree::new(root_only, 0);
        let root_id = lazy.tree.root().id;
        assert!(lazy.is_frontier(root_id));
        lazy.expand_node(root_id);
        assert!(!lazy.tree.node(root_id).children.is_empty());
    }

    #[test]
    fn expand_node_is_idempotent() {
        let params = GameParams::new(4, 1, 2, 4).unwrap();
        let root_only = build_game_tree(params, true, false).unwrap();
        let mut lazy = LazyTree::new(root_only, 5);
        let root_id = lazy.tree.root().id;
        lazy.expand_node(root_id);
        let count_after_first = lazy.tree.nodes.len();
        lazy.expand_node(root_id);
        assert_eq!(lazy.tree.nodes.len(), count_after_first);
    }
}
