use std::collections::HashMap;

use hulhe_tree::{GameTree, NodeId};

use crate::id::canonical_infoset_id;

/// Precomputed node↔infoset mapping: walks the tree once so traversal
/// gets O(1) node→infoset lookup instead of
/// recomputing the canonical id string on every visit.
///
/// Built for a fixed hole/board token pair since the betting tree alone is
/// card-agnostic; a new `TreeIndex` is built (or `reindex`-ed) per deal
/// during training, or once with `None, None` for card-free betting-only
/// analysis.
#[derive(Debug, Default)]
pub struct TreeIndex {
    node_to_infoset: HashMap<NodeId, String>,
    infoset_to_nodes: HashMap<String, Vec<NodeId>>,
}

impl TreeIndex {
    pub fn build(tree: &GameTree, hole_token: Option<&str>, board_token: Option<&str>) -> Self {
        let mut node_to_infoset = HashMap::with_capacity(tree.player_nodes.len());
        let mut infoset_to_nodes: HashMap<String, Vec<NodeId>> = HashMap::new();
        for &id in &tree.player_nodes {
            let node = tree.node(id);
            let infoset_id = canonical_infoset_id(node, hole_token, board_token);
            infoset_to_nodes
                .entry(infoset_id.clone())
                .or_default()
                .push(id);
            node_to_infoset.insert(id, infoset_id);
        }
        Self {
            node_to_infoset,
            infoset_to_nodes,
        }
    }

    pub fn infoset_of(&self, node: NodeId) -> Option<&str> {
        self.node_to_infoset.get(&node).map(String::as_str)
    }

    pub fn nodes_of(&self, infoset_id: &str) -> &[NodeId] {
        self.infoset_to_nodes
            .get(infoset_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn num_infosets(&self) -> usize {
        self.infoset_to_nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hulhe_core::GameParams;
    use hulhe_tree::build_game_tree;

    #[test]
    fn every_player_node_resolves_to_an_infoset() {
        let tree = build_game_tree(GameParams::new(4, 1, 2, 4).unwrap(), true, false).unwrap();
        let index = TreeIndex::build(&tree, None, None);
        for &id in &tree.player_nodes {
            assert!(index.infoset_of(id).is_some());
        }
    }

    #[test]
    fn nodes_of_round_trips_with_infoset_of() {
        let tree = build_game_tree(GameParams::new(4, 1, 2, 4).unwrap(), true, false).unwrap();
        let index = TreeIndex::build(&tree, None, None);
        let root = tree.root().id;
        let infoset = index.infoset_of(root).unwrap().to_owned();
        assert!(index.nodes_of(&infoset).contains(&root));
    }
}
