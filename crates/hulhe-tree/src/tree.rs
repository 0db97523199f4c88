use std::collections::HashMap;

use hulhe_cards::Street;
use hulhe_core::{Chips, GameParams};
use log::debug;

use crate::action::{resolve_action, Action, ActionOutcome};
use crate::error::TreeError;
use crate::node::{GameNode, NodeId, NodeKind, Player, TerminalKind};
use crate::sequence::{enumerate_sequences, SequenceEnd};

/// The full HU-LHE betting tree (spec.md §3's `GameTree`).
///
/// Nodes are stored in a flat arena indexed by [`NodeId`]; there is no
/// owning parent/child pointer graph, only integer back- and
/// forward-references (spec.md §9's "no cyclic ownership").
#[derive(Debug, Clone)]
pub struct GameTree {
    pub params: GameParams,
    pub nodes: Vec<GameNode>,
    pub terminal_nodes: Vec<NodeId>,
    pub player_nodes: Vec<NodeId>,
    /// Canonical infoset id → every node sharing that id. Populated lazily
    /// by `hulhe-store`'s indexer once cards are known; the betting-only
    /// skeleton built here carries no card tokens.
    pub infosets: HashMap<String, Vec<NodeId>>,
}

impl GameTree {
    pub fn root(&self) -> &GameNode {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> &GameNode {
        &self.nodes[id as usize]
    }

    /// Verify the invariants spec.md §3/§4.2/§8 require of a finished tree:
    /// every player node has ≥1 child, every terminal has utilities, and
    /// every child's `parent` back-reference matches.
    pub fn validate(&self) -> Result<(), TreeError> {
        for node in &self.nodes {
            if node.is_player() && node.children.is_empty() {
                return Err(TreeError::ChildlessPlayerNode { node: node.id });
            }
            if node.is_terminal() && node.utilities.is_none() {
                return Err(TreeError::TerminalMissingUtilities { node: node.id });
            }
            for &child_id in &node.children {
                let child = &self.nodes[child_id as usize];
                if child.parent != Some(node.id) {
                    return Err(TreeError::InconsistentParentChild {
                        node: child.id,
                        expected_parent: node.id,
                    });
                }
            }
        }
        self.check_no_orphans()
    }

    fn check_no_orphans(&self) -> Result<(), TreeError> {
        let mut reachable = vec![false; self.nodes.len()];
        let mut stack = vec![0u32];
        reachable[0] = true;
        while let Some(id) = stack.pop() {
            for &child in &self.nodes[id as usize].children {
                if !reachable[child as usize] {
                    reachable[child as usize] = true;
                    stack.push(child);
                }
            }
        }
        match reachable.iter().position(|&r| !r) {
            Some(idx) => Err(TreeError::UnreachableNode { node: idx as u32 }),
            None => Ok(()),
        }
    }
}

/// Build the full HU-LHE game tree from scratch (spec.md §4.2).
///
/// `preflop_only` stops at the first street transition instead of recursing
/// into flop/turn/river, producing the small tree used by scenario 1 of
/// spec.md §8 and by quick CLI smoke runs.
pub fn build_game_tree(
    params: GameParams,
    preflop_only: bool,
    verbose: bool,
) -> Result<GameTree, TreeError> {
    let mut builder = Builder {
        params,
        nodes: Vec::new(),
        terminal_nodes: Vec::new(),
        player_nodes: Vec::new(),
    };

    let root_id = builder.push_root();
    builder.expand_street(root_id, preflop_only, verbose);

    let tree = GameTree {
        params: builder.params,
        nodes: builder.nodes,
        terminal_nodes: builder.terminal_nodes,
        player_nodes: builder.player_nodes,
        infosets: HashMap::new(),
    };
    tree.validate()?;
    Ok(tree)
}

struct Builder {
    params: GameParams,
    nodes: Vec<GameNode>,
    terminal_nodes: Vec<NodeId>,
    player_nodes: Vec<NodeId>,
}

impl Builder {
    fn push_root(&mut self) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(GameNode {
            id,
            kind: NodeKind::Player,
            to_act: Some(Player::P0),
            street: Street::Preflop,
            invested: [self.params.small_blind, self.params.big_blind],
            raises_this_street: 0,
            facing_bet: false,
            history: String::new(),
            parent: None,
            action_to_child: Vec::new(),
            children: Vec::new(),
            terminal_kind: None,
            utilities: None,
            visit_count: std::sync::atomic::AtomicU64::new(0),
        });
        self.player_nodes.push(id);
        id
    }

    /// Expand one street's betting round starting at `root_id`, unfolding
    /// every enumerated [`BetSequence`] node-by-node, then recursing into
    /// the next street (or stopping at preflop per `preflop_only`, or
    /// marking showdown on the river).
    fn expand_street(&mut self, root_id: NodeId, preflop_only: bool, verbose: bool) {
        let root = &self.nodes[root_id as usize];
        let street = root.street;
        let invested = root.invested;
        let bet_size = self.params.small_blind * street.bet_size_multiplier() as Chips;
        let is_preflop = street == Street::Preflop;
        let to_act = if is_preflop { Player::P0 } else { Player::P1 };
        let entry_cost = if is_preflop {
            self.params.big_blind - self.params.small_blind
        } else {
            0
        };

        let sequences = enumerate_sequences(
            invested,
            false,
            0,
            to_act,
            self.params.max_raises_per_street,
            bet_size,
            is_preflop,
            entry_cost,
        );
        if verbose {
            debug!(
                "street {street}: {} legal sequences from node {root_id}",
                sequences.len()
            );
        }

        for sequence in &sequences {
            let mut cursor = root_id;
            let mut cursor_invested = invested;
            let mut cursor_to_act = to_act;
            let mut cursor_facing = false;
            let mut cursor_raises = 0usize;

            for (step_idx, &action) in sequence.actions.iter().enumerate() {
                let is_last = step_idx + 1 == sequence.actions.len();
                if let Some(existing) = self.nodes[cursor as usize].child_for(action) {
                    cursor = existing;
                    let node = &self.nodes[cursor as usize];
                    cursor_invested = node.invested;
                    cursor_facing = node.facing_bet;
                    cursor_raises = node.raises_this_street;
                    cursor_to_act = cursor_to_act.opponent();
                    continue;
                }

                let actor = cursor_to_act;
                let cost = self.action_cost(
                    action,
                    cursor_facing,
                    cursor_raises,
                    step_idx == 0 && is_preflop,
                    bet_size,
                    entry_cost,
                );
                cursor_invested[actor.index()] += cost;
                let new_raises = if action == Action::Raise {
                    cursor_raises + 1
                } else {
                    cursor_raises
                };
                let new_facing = action == Action::Raise;

                let is_fold_terminal = action == Action::Fold;
                let is_street_end = is_last && !is_fold_terminal;

                let child_id = self.nodes.len() as NodeId;
                let mut history = self.nodes[cursor as usize].history.clone();
                history.push(action.history_char());

                let (kind, next_to_act) = if is_fold_terminal {
                    (NodeKind::Terminal, None)
                } else if is_street_end {
                    if street.is_terminal_street() {
                        (NodeKind::Terminal, None)
                    } else if preflop_only {
                        (NodeKind::Terminal, None)
                    } else {
                        (NodeKind::Chance, None)
                    }
                } else {
                    (NodeKind::Player, Some(actor.opponent()))
                };

                let terminal_kind = match kind {
                    NodeKind::Terminal if is_fold_terminal => Some(TerminalKind::Fold),
                    NodeKind::Terminal => Some(TerminalKind::Showdown),
                    _ => None,
                };

                let utilities = terminal_kind.map(|tk| match tk {
                    // Invested-chips accounting (spec.md §4.2): the folder
                    // loses exactly what it put in, the other player wins it.
                    TerminalKind::Fold => {
                        let folder_loss = cursor_invested[actor.index()] as f64;
                        if actor == Player::P0 {
                            (-folder_loss, folder_loss)
                        } else {
                            (folder_loss, -folder_loss)
                        }
                    }
                    TerminalKind::Showdown => (0.0, 0.0),
                });

                self.nodes.push(GameNode {
                    id: child_id,
                    kind,
                    to_act: next_to_act,
                    street,
                    invested: cursor_invested,
                    raises_this_street: new_raises,
                    facing_bet: new_facing,
                    history,
                    parent: Some(cursor),
                    action_to_child: Vec::new(),
                    children: Vec::new(),
                    terminal_kind,
                    utilities,
                    visit_count: std::sync::atomic::AtomicU64::new(0),
                });

                self.nodes[cursor as usize]
                    .action_to_child
                    .push((action, child_id));
                self.nodes[cursor as usize].children.push(child_id);

                match kind {
                    NodeKind::Terminal => self.terminal_nodes.push(child_id),
                    NodeKind::Player => self.player_nodes.push(child_id),
                    NodeKind::Chance => {}
                }

                cursor = child_id;
                cursor_facing = new_facing;
                cursor_raises = new_raises;
                cursor_to_act = cursor_to_act.opponent();

                if kind == NodeKind::Chance {
                    self.expand_chance(child_id, street.next(), cursor_invested, verbose);
                }
            }
        }
    }

    /// A chance node has exactly one deterministic "deal the next card(s)"
    /// child in this betting-tree-only builder (card identities are
    /// resolved later by the evaluator, not here); it immediately opens the
    /// next street's player-node subtree with P1 to act first (spec.md
    /// §4.2 step 3's "P1-first rule for postflop").
    fn expand_chance(
        &mut self,
        chance_id: NodeId,
        next_street: Street,
        invested: [Chips; 2],
        verbose: bool,
    ) {
        let child_id = self.nodes.len() as NodeId;
        self.nodes.push(GameNode {
            id: child_id,
            kind: NodeKind::Player,
            to_act: Some(Player::P1),
            street: next_street,
            invested,
            raises_this_street: 0,
            facing_bet: false,
            history: self.nodes[chance_id as usize].history.clone(),
            parent: Some(chance_id),
            action_to_child: Vec::new(),
            children: Vec::new(),
            terminal_kind: None,
            utilities: None,
            visit_count: std::sync::atomic::AtomicU64::new(0),
        });
        self.nodes[chance_id as usize].children.push(child_id);
        self.nodes[chance_id as usize]
            .action_to_child
            .push((Action::CheckCall, child_id));
        self.player_nodes.push(child_id);
        self.expand_street(child_id, false, verbose);
    }

    /// Delegates to [`resolve_action`] for the cost; `expand_street` derives
    /// round-closing and next-actor state itself from the bet sequence, so
    /// only the `Chips` half of [`ActionOutcome`] is needed here.
    fn action_cost(
        &self,
        action: Action,
        facing_bet: bool,
        raises_this_street: usize,
        is_preflop_root: bool,
        bet_size: Chips,
        entry_cost: Chips,
    ) -> Chips {
        match resolve_action(
            action,
            facing_bet,
            raises_this_street,
            is_preflop_root,
            bet_size,
            entry_cost,
        ) {
            ActionOutcome::Fold => 0,
            ActionOutcome::Continue { cost, .. } => cost,
            ActionOutcome::ClosesStreet { cost } => cost,
        }
    }
}

/// Re-derive terminal utilities in a pass over an already-built tree
/// (spec.md §4.2's `evaluate_terminal_utilities`), useful after a
/// serialization round-trip that dropped them or when re-resolving
/// showdowns with a different [`hulhe_cards::HandEvaluator`].
pub fn evaluate_terminal_utilities<F>(tree: &mut GameTree, mut showdown: F)
where
    F: FnMut(&GameNode) -> (f64, f64),
{
    for &id in &tree.terminal_nodes.clone() {
        let node = &tree.nodes[id as usize];
        let utilities = match node.terminal_kind {
            Some(TerminalKind::Fold) => node.utilities.unwrap_or((0.0, 0.0)),
            Some(TerminalKind::Showdown) => showdown(node),
            None => (0.0, 0.0),
        };
        tree.nodes[id as usize].utilities = Some(utilities);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cap4() -> GameParams {
        GameParams::new(4, 1, 2, 4).unwrap()
    }

    #[test]
    fn preflop_only_root_matches_spec_scenario_one() {
        let tree = build_game_tree(cap4(), true, false).unwrap();
        let root = tree.root();
        assert_eq!(root.pot(), 3);
        assert!(!root.facing_bet);
        assert_eq!(root.to_act, Some(Player::P0));
    }

    #[test]
    fn preflop_only_sequence_count_in_spec_range() {
        let tree = build_game_tree(cap4(), true, false).unwrap();
        // every terminal or street-ending leaf corresponds 1:1 to a BetSequence
        assert!(tree.terminal_nodes.len() + 1 >= 15);
    }

    #[test]
    fn sb_fold_utilities_are_zero_sum_and_favor_the_caller() {
        let tree = build_game_tree(cap4(), true, false).unwrap();
        let fold_node = tree
            .terminal_nodes
            .iter()
            .map(|&id| tree.node(id))
            .find(|n| n.history == "f")
            .expect("SB fold terminal must exist");
        let (u0, u1) = fold_node.utilities.unwrap();
        assert_eq!(u0, -1.0);
        assert_eq!(u1, 1.0);
        assert_eq!(u0 + u1, 0.0);
    }

    #[test]
    fn every_player_node_has_at_least_one_child() {
        let tree = build_game_tree(cap4(), true, false).unwrap();
        for &id in &tree.player_nodes {
            assert!(!tree.node(id).children.is_empty());
        }
    }

    #[test]
    fn full_tree_with_chance_nodes_validates() {
        let tree = build_game_tree(GameParams::new(20, 1, 2, 2).unwrap(), false, false).unwrap();
        tree.validate().expect("full tree must satisfy invariants");
        assert!(tree.nodes.iter().any(|n| n.is_chance()));
    }
}
