use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::TreeError;
use crate::node::{NodeId, NodeKind, TerminalKind};
use crate::tree::GameTree;

/// One of spec.md §4.3's four pruning strategies. Each preserves the root
/// and the parent-child consistency of whatever nodes remain.
#[derive(Debug, Clone, Copy)]
pub enum PruneStrategy {
    /// Discard any node deeper than `max_depth` from the root.
    Depth { max_depth: usize },
    /// Discard any node whose [`importance`] score falls below `threshold`.
    Importance { threshold: f64 },
    /// Discard any node visited fewer than `min_visits` times.
    Frequency { min_visits: u64 },
    /// Repeatedly discard the least-important node until the tree has
    /// `target` nodes or fewer, never going below `min_nodes_to_keep`.
    Adaptive {
        target: usize,
        min_nodes_to_keep: usize,
    },
}

/// Normalized reach probability × subtree payoff magnitude (spec.md §9's
/// suggested resolution for the ambiguous importance/frequency combining
/// rule), computed root-down so root importance is exactly 1.0.
pub fn importance(tree: &GameTree) -> HashMap<NodeId, f64> {
    let mut scores = HashMap::new();
    scores.insert(tree.root().id, 1.0);
    let mut queue = vec![tree.root().id];
    while let Some(id) = queue.pop() {
        let node = tree.node(id);
        let parent_score = scores[&id];
        let n_children = node.children.len().max(1) as f64;
        for &child in &node.children {
            let payoff_weight = tree
                .node(child)
                .utilities
                .map(|(u0, u1)| (u0.abs() + u1.abs()).max(1.0))
                .unwrap_or(1.0);
            let score = (parent_score / n_children) * payoff_weight.ln_1p();
            let score = score.clamp(0.0, 1.0);
            scores.insert(child, score);
            queue.push(child);
        }
    }
    scores
}

/// Apply a pruning strategy, returning the surviving node set's ids. Never
/// removes the root; orphan removal (see [`remove_orphans`]) is run
/// afterward so the result is connectivity-consistent.
pub fn prune(tree: &GameTree, strategy: PruneStrategy) -> Result<GameTree, TreeError> {
    let keep: HashSet<NodeId> = match strategy {
        PruneStrategy::Depth { max_depth } => {
            let mut keep = HashSet::new();
            let mut queue = vec![(tree.root().id, 0usize)];
            while let Some((id, depth)) = queue.pop() {
                keep.insert(id);
                if depth < max_depth {
                    for &child in &tree.node(id).children {
                        queue.push((child, depth + 1));
                    }
                }
            }
            keep
        }
        PruneStrategy::Importance { threshold } => {
            let scores = importance(tree);
            scores
                .into_iter()
                .filter(|&(_, score)| score >= threshold)
                .map(|(id, _)| id)
                .chain(std::iter::once(tree.root().id))
                .collect()
        }
        PruneStrategy::Frequency { min_visits } => tree
            .nodes
            .iter()
            .filter(|n| n.visit_count.load(Ordering::Relaxed) >= min_visits)
            .map(|n| n.id)
            .chain(std::iter::once(tree.root().id))
            .collect(),
        PruneStrategy::Adaptive {
            target,
            min_nodes_to_keep,
        } => {
            let scores = importance(tree);
            let mut by_score: Vec<(NodeId, f64)> = scores.into_iter().collect();
            by_score.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
            let mut keep: HashSet<NodeId> = tree.nodes.iter().map(|n| n.id).collect();
            let floor = min_nodes_to_keep.max(1);
            for (id, _) in by_score {
                if keep.len() <= target.max(floor) {
                    break;
                }
                if id == tree.root().id {
                    continue;
                }
                if keep.len() > floor {
                    keep.remove(&id);
                }
            }
            keep
        }
    };

    rebuild_from_keep_set(tree, &keep)
}

/// Scan connectivity from root and discard anything unreachable
/// (spec.md §4.3's "Orphan removal").
pub fn remove_orphans(tree: &GameTree) -> GameTree {
    let mut reachable = HashSet::new();
    let mut stack = vec![tree.root().id];
    reachable.insert(tree.root().id);
    while let Some(id) = stack.pop() {
        for &child in &tree.node(id).children {
            if reachable.insert(child) {
                stack.push(child);
            }
        }
    }
    rebuild_from_keep_set(tree, &reachable).expect("orphan removal never disconnects the root")
}

fn rebuild_from_keep_set(tree: &GameTree, keep: &HashSet<NodeId>) -> Result<GameTree, TreeError> {
    let mut remap: HashMap<NodeId, NodeId> = HashMap::new();
    let mut ordered: Vec<NodeId> = keep.iter().copied().collect();
    ordered.sort_unstable();
    for (new_id, &old_id) in ordered.iter().enumerate() {
        remap.insert(old_id, new_id as NodeId);
    }

    let mut nodes = Vec::with_capacity(ordered.len());
    let mut terminal_nodes = Vec::new();
    let mut player_nodes = Vec::new();

    for &old_id in &ordered {
        let original_had_children = !tree.node(old_id).children.is_empty();
        let mut node = tree.node(old_id).clone();
        node.id = remap[&old_id];
        node.parent = node.parent.and_then(|p| remap.get(&p).copied());
        node.children.retain(|c| remap.contains_key(c));
        node.children = node.children.iter().map(|c| remap[c]).collect();
        node.action_to_child.retain(|(_, c)| remap.contains_key(c));
        node.action_to_child = node
            .action_to_child
            .iter()
            .map(|(a, c)| (*a, remap[c]))
            .collect();

        // A player node whose entire subtree got cut becomes a synthetic
        // showdown terminal rather than a dangling childless node: the
        // pruned tree must still validate, and a neutral (0, 0) payoff is
        // the least-committal stand-in for "unexplored beyond this point".
        if node.is_player() && node.children.is_empty() && original_had_children {
            node.kind = NodeKind::Terminal;
            node.to_act = None;
            node.terminal_kind = Some(TerminalKind::Showdown);
            node.utilities = Some((0.0, 0.0));
        }

        if node.is_terminal() {
            terminal_nodes.push(node.id);
        } else if node.is_player() {
            player_nodes.push(node.id);
        }
        nodes.push(node);
    }

    let pruned = GameTree {
        params: tree.params,
        nodes,
        terminal_nodes,
        player_nodes,
        infosets: HashMap::new(),
    };
    pruned.validate()?;
    Ok(pruned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::build_game_tree;
    use hulhe_core::GameParams;

    fn small_tree() -> GameTree {
        build_game_tree(GameParams::new(10, 1, 2, 2).unwrap(), false, false).unwrap()
    }

    #[test]
    fn depth_pruning_preserves_root() {
        let tree = small_tree();
        let pruned = prune(&tree, PruneStrategy::Depth { max_depth: 1 }).unwrap();
        assert_eq!(pruned.root().pot(), tree.root().pot());
        assert!(pruned.nodes.len() < tree.nodes.len());
    }

    #[test]
    fn depth_pruning_converts_boundary_player_nodes_to_terminals() {
        let tree = small_tree();
        let boundary_count = tree
            .root()
            .children
            .iter()
            .filter(|&&id| !tree.node(id).children.is_empty())
            .count();
        let pruned = prune(&tree, PruneStrategy::Depth { max_depth: 1 }).unwrap();
        let terminal_at_boundary = pruned
            .terminal_nodes
            .iter()
            .filter(|&&id| pruned.node(id).parent == Some(pruned.root().id))
            .count();
        assert_eq!(terminal_at_boundary, boundary_count);
    }

    #[test]
    fn frequency_pruning_drops_unvisited_subtrees_and_keeps_the_root() {
        let tree = small_tree();
        tree.root().visit_count.store(10, Ordering::Relaxed);
        for &child in &tree.root().children {
            tree.node(child).visit_count.store(5, Ordering::Relaxed);
        }
        let pruned = prune(&tree, PruneStrategy::Frequency { min_visits: 1 }).unwrap();
        assert!(pruned.nodes.len() < tree.nodes.len());
        assert!(pruned.nodes.len() >= 1 + tree.root().children.len());
    }

    #[test]
    fn adaptive_pruning_never_drops_below_minimum() {
        let tree = small_tree();
        let pruned = prune(
            &tree,
            PruneStrategy::Adaptive {
                target: 1,
                min_nodes_to_keep: 5,
            },
        )
        .unwrap();
        assert!(pruned.nodes.len() >= 5);
    }

    #[test]
    fn orphan_removal_is_idempotent() {
        let tree = small_tree();
        let once = remove_orphans(&tree);
        let twice = remove_orphans(&once);
        assert_eq!(once.nodes.len(), twice.nodes.len());
    }

    #[test]
    fn root_importance_is_one() {
        let tree = small_tree();
        let scores = importance(&tree);
        assert_eq!(scores[&tree.root().id], 1.0);
    }
}
