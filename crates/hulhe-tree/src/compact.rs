use crate::error::TreeError;
use crate::node::{GameNode, NodeKind, Player, TerminalKind};
use crate::tree::GameTree;
use hulhe_cards::Street;
use hulhe_core::Chips;

/// One interned betting history or utility pair, indexed by `u32`.
///
/// Compact nodes store an index into these tables instead of inline data,
/// per spec.md §4.3: "Betting histories and utilities live in shared
/// interning tables".
#[derive(Debug, Clone, Default)]
pub struct InternTables {
    pub histories: Vec<String>,
    pub utilities: Vec<(f64, f64)>,
}

impl InternTables {
    fn intern_history(&mut self, history: &str) -> u32 {
        if let Some(idx) = self.histories.iter().position(|h| h == history) {
            return idx as u32;
        }
        self.histories.push(history.to_owned());
        (self.histories.len() - 1) as u32
    }

    fn intern_utilities(&mut self, utilities: (f64, f64)) -> u16 {
        if let Some(idx) = self.utilities.iter().position(|&u| u == utilities) {
            return idx as u16;
        }
        self.utilities.push(utilities);
        (self.utilities.len() - 1) as u16
    }
}

/// A 64-bit packed node record (spec.md §4.3):
/// `{player:2, street:2, terminal_kind:3, facing_bet:1, is_terminal:1,
/// num_children:3, history_idx:32, utilities_idx:16, padding:4}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactNode(u64);

const PLAYER_SHIFT: u32 = 0;
const STREET_SHIFT: u32 = 2;
const TERMINAL_KIND_SHIFT: u32 = 4;
const FACING_BET_SHIFT: u32 = 7;
const IS_TERMINAL_SHIFT: u32 = 8;
const NUM_CHILDREN_SHIFT: u32 = 9;
const HISTORY_IDX_SHIFT: u32 = 12;
const UTILITIES_IDX_SHIFT: u32 = 44;

impl CompactNode {
    fn pack(
        player: u8,
        street: u8,
        terminal_kind: u8,
        facing_bet: bool,
        is_terminal: bool,
        num_children: u8,
        history_idx: u32,
        utilities_idx: u16,
    ) -> Self {
        debug_assert!(player < 4);
        debug_assert!(street < 4);
        debug_assert!(terminal_kind < 8);
        debug_assert!(num_children < 8);
        let mut bits = 0u64;
        bits |= (player as u64) << PLAYER_SHIFT;
        bits |= (street as u64) << STREET_SHIFT;
        bits |= (terminal_kind as u64) << TERMINAL_KIND_SHIFT;
        bits |= (facing_bet as u64) << FACING_BET_SHIFT;
        bits |= (is_terminal as u64) << IS_TERMINAL_SHIFT;
        bits |= (num_children as u64) << NUM_CHILDREN_SHIFT;
        bits |= (history_idx as u64) << HISTORY_IDX_SHIFT;
        bits |= (utilities_idx as u64) << UTILITIES_IDX_SHIFT;
        Self(bits)
    }

    pub fn player(&self) -> u8 {
        ((self.0 >> PLAYER_SHIFT) & 0b11) as u8
    }
    pub fn street(&self) -> u8 {
        ((self.0 >> STREET_SHIFT) & 0b11) as u8
    }
    pub fn terminal_kind(&self) -> u8 {
        ((self.0 >> TERMINAL_KIND_SHIFT) & 0b111) as u8
    }
    pub fn facing_bet(&self) -> bool {
        (self.0 >> FACING_BET_SHIFT) & 1 != 0
    }
    pub fn is_terminal(&self) -> bool {
        (self.0 >> IS_TERMINAL_SHIFT) & 1 != 0
    }
    pub fn num_children(&self) -> u8 {
        ((self.0 >> NUM_CHILDREN_SHIFT) & 0b111) as u8
    }
    pub fn history_idx(&self) -> u32 {
        ((self.0 >> HISTORY_IDX_SHIFT) & 0xFFFF_FFFF) as u32
    }
    pub fn utilities_idx(&self) -> u16 {
        ((self.0 >> UTILITIES_IDX_SHIFT) & 0xFFFF) as u16
    }
}

/// The compact projection of a [`GameTree`] (spec.md §4.3): "a pure
/// projection of the regular form"; children/parent edges and invested
/// chips still live in parallel arenas since they do not fit the 64-bit
/// word, but betting history text and utility pairs are interned.
#[derive(Debug, Clone)]
pub struct CompactTree {
    pub packed: Vec<CompactNode>,
    pub children: Vec<Vec<u32>>,
    pub parents: Vec<Option<u32>>,
    pub invested: Vec<[Chips; 2]>,
    pub tables: InternTables,
}

fn street_code(street: Street) -> u8 {
    match street {
        Street::Preflop => 0,
        Street::Flop => 1,
        Street::Turn => 2,
        Street::River => 3,
    }
}

fn street_from_code(code: u8) -> Street {
    match code {
        0 => Street::Preflop,
        1 => Street::Flop,
        2 => Street::Turn,
        _ => Street::River,
    }
}

fn player_code(player: Option<Player>) -> u8 {
    match player {
        Some(Player::P0) => 0,
        Some(Player::P1) => 1,
        None => 2,
    }
}

fn terminal_kind_code(kind: Option<TerminalKind>) -> u8 {
    match kind {
        None => 0,
        Some(TerminalKind::Fold) => 1,
        Some(TerminalKind::Showdown) => 2,
    }
}

/// Project a [`GameTree`] into its compact form. Pure and total: every
/// regular-form node maps onto exactly one packed word plus shared-table
/// entries.
pub fn compress(tree: &GameTree) -> Result<CompactTree, TreeError> {
    let mut tables = InternTables::default();
    let mut packed = Vec::with_capacity(tree.nodes.len());
    let mut children = Vec::with_capacity(tree.nodes.len());
    let mut parents = Vec::with_capacity(tree.nodes.len());
    let mut invested = Vec::with_capacity(tree.nodes.len());

    for node in &tree.nodes {
        if node.children.len() > 7 {
            return Err(TreeError::TooManyChildren {
                node: node.id,
                count: node.children.len(),
            });
        }
        let history_idx = tables.intern_history(&node.history);
        let utilities_idx = tables.intern_utilities(node.utilities.unwrap_or((0.0, 0.0)));
        packed.push(CompactNode::pack(
            player_code(node.to_act),
            street_code(node.street),
            terminal_kind_code(node.terminal_kind),
            node.facing_bet,
            node.is_terminal(),
            node.children.len() as u8,
            history_idx,
            utilities_idx,
        ));
        children.push(node.children.clone());
        parents.push(node.parent);
        invested.push(node.invested);
    }

    Ok(CompactTree {
        packed,
        children,
        parents,
        invested,
        tables,
    })
}

/// Inverse of [`compress`]; round-trips every invariant `compress` reads
/// from the regular form (spec.md §8: `decompress(compress(tree)) ≡ tree`
/// on counts, root properties, and terminal-count preservation).
///
/// `action_to_child` comes back empty: the packed word does not carry
/// per-edge action labels, only child node ids, so it cannot be
/// reconstructed from the compact form alone. Callers that need exact
/// action identity should keep the original [`GameTree`] rather than
/// round-tripping through the compact form.
///
/// Fails with [`TreeError::InternIndexOutOfRange`] if a packed word's
/// history or utilities index falls outside its table — a sign the
/// `CompactTree` was built against a different `InternTables` than the
/// one it's paired with, or has been corrupted.
pub fn decompress(compact: &CompactTree, params: hulhe_core::GameParams) -> Result<GameTree, TreeError> {
    let mut nodes = Vec::with_capacity(compact.packed.len());
    let mut terminal_nodes = Vec::new();
    let mut player_nodes = Vec::new();

    for (id, word) in compact.packed.iter().enumerate() {
        let id = id as u32;
        let to_act = match word.player() {
            0 => Some(Player::P0),
            1 => Some(Player::P1),
            _ => None,
        };
        let kind = if word.is_terminal() {
            NodeKind::Terminal
        } else if to_act.is_some() {
            NodeKind::Player
        } else {
            NodeKind::Chance
        };
        let terminal_kind = match word.terminal_kind() {
            1 => Some(TerminalKind::Fold),
            2 => Some(TerminalKind::Showdown),
            _ => None,
        };
        let utilities = if word.is_terminal() {
            let idx = word.utilities_idx() as usize;
            let utility = compact.tables.utilities.get(idx).copied().ok_or(
                TreeError::InternIndexOutOfRange {
                    index: word.utilities_idx() as u32,
                    table_len: compact.tables.utilities.len(),
                },
            )?;
            Some(utility)
        } else {
            None
        };
        let history_idx = word.history_idx() as usize;
        let history = compact
            .tables
            .histories
            .get(history_idx)
            .cloned()
            .ok_or(TreeError::InternIndexOutOfRange {
                index: word.history_idx(),
                table_len: compact.tables.histories.len(),
            })?;

        nodes.push(GameNode {
            id,
            kind,
            to_act,
            street: street_from_code(word.street()),
            invested: compact.invested[id as usize],
            raises_this_street: history.matches('r').count(),
            facing_bet: word.facing_bet(),
            history,
            parent: compact.parents[id as usize],
            action_to_child: Vec::new(),
            children: compact.children[id as usize].clone(),
            terminal_kind,
            utilities,
            visit_count: std::sync::atomic::AtomicU64::new(0),
        });

        match kind {
            NodeKind::Terminal => terminal_nodes.push(id),
            NodeKind::Player => player_nodes.push(id),
            NodeKind::Chance => {}
        }
    }

    Ok(GameTree {
        params,
        nodes,
        terminal_nodes,
        player_nodes,
        infosets: Default::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::build_game_tree;

    #[test]
    fn round_trip_preserves_counts_and_root() {
        let params = hulhe_core::GameParams::new(4, 1, 2, 4).unwrap();
        let tree = build_game_tree(params, true, false).unwrap();
        let compact = compress(&tree).unwrap();
        let back = decompress(&compact, params).unwrap();

        assert_eq!(back.nodes.len(), tree.nodes.len());
        assert_eq!(back.terminal_nodes.len(), tree.terminal_nodes.len());
        assert_eq!(back.root().pot(), tree.root().pot());
        assert_eq!(back.root().to_act, tree.root().to_act);
    }

    #[test]
    fn pack_unpack_is_identity_on_fields() {
        let word = CompactNode::pack(1, 2, 2, true, true, 3, 123, 45);
        assert_eq!(word.player(), 1);
        assert_eq!(word.street(), 2);
        assert_eq!(word.terminal_kind(), 2);
        assert!(word.facing_bet());
        assert!(word.is_terminal());
        assert_eq!(word.num_children(), 3);
        assert_eq!(word.history_idx(), 123);
        assert_eq!(word.utilities_idx(), 45);
    }
}
