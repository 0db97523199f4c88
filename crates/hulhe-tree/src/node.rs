use std::sync::atomic::AtomicU64;

use hulhe_core::Chips;
use hulhe_cards::Street;

use crate::action::Action;

pub type NodeId = u32;

/// A betting-tree seat. Not to be confused with a `HandEvaluator`'s notion
/// of a player; this only tracks whose turn it is to act.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Player {
    P0,
    P1,
}

impl Player {
    pub const fn opponent(&self) -> Player {
        match self {
            Player::P0 => Player::P1,
            Player::P1 => Player::P0,
        }
    }

    pub const fn index(&self) -> usize {
        match self {
            Player::P0 => 0,
            Player::P1 => 1,
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.index())
    }
}

/// Discriminates why a terminal node ended, per spec.md §3's `terminal kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    Fold = 1,
    Showdown = 2,
}

/// The tagged-variant node kind (spec.md §9: "dynamic dispatch over node
/// kinds ... modeled as a tagged variant").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Player,
    Chance,
    Terminal,
}

/// One node of the HU-LHE betting tree (the "regular", rich representation;
/// see [`crate::compact`] for the projected 64-bit packed form).
#[derive(Debug)]
pub struct GameNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub to_act: Option<Player>,
    pub street: Street,
    /// Running chip investment per player; `pot` is always their sum.
    pub invested: [Chips; 2],
    pub raises_this_street: usize,
    pub facing_bet: bool,
    pub history: String,
    pub parent: Option<NodeId>,
    /// Parallel to `children`: the action taken to reach each child.
    pub action_to_child: Vec<(Action, NodeId)>,
    pub children: Vec<NodeId>,
    pub terminal_kind: Option<TerminalKind>,
    pub utilities: Option<(f64, f64)>,
    /// Times this node has been reached by a traversal, for
    /// `PruneStrategy::Frequency`. Bumped with `Relaxed` ordering from
    /// `&GameTree` during (possibly parallel) traversal; exactness across
    /// threads isn't required, only a representative count.
    pub visit_count: AtomicU64,
}

impl Clone for GameNode {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            kind: self.kind,
            to_act: self.to_act,
            street: self.street,
            invested: self.invested,
            raises_this_street: self.raises_this_street,
            facing_bet: self.facing_bet,
            history: self.history.clone(),
            parent: self.parent,
            action_to_child: self.action_to_child.clone(),
            children: self.children.clone(),
            terminal_kind: self.terminal_kind,
            utilities: self.utilities,
            visit_count: AtomicU64::new(self.visit_count.load(std::sync::atomic::Ordering::Relaxed)),
        }
    }
}

impl GameNode {
    pub fn pot(&self) -> Chips {
        self.invested[0] + self.invested[1]
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Terminal)
    }

    pub const fn is_player(&self) -> bool {
        matches!(self.kind, NodeKind::Player)
    }

    pub const fn is_chance(&self) -> bool {
        matches!(self.kind, NodeKind::Chance)
    }

    pub fn child_for(&self, action: Action) -> Option<NodeId> {
        self.action_to_child
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, child)| *child)
    }
}
