//! Betting-sequence enumeration, the full HU-LHE tree builder, and its
//! memory layouts (compact packed form, node pool, lazy expansion, and
//! pruning strategies).

mod action;
mod compact;
mod error;
mod lazy;
mod node;
mod pool;
mod prune;
mod sequence;
mod tree;

pub use action::{legal_actions, resolve_action, Action, ActionOutcome};
pub use compact::{compress, decompress, CompactNode, CompactTree, InternTables};
pub use error::TreeError;
pub use lazy::LazyTree;
pub use node::{GameNode, NodeId, NodeKind, Player, TerminalKind};
pub use pool::NodePool;
pub use prune::{importance, prune, remove_orphans, PruneStrategy};
pub use sequence::{enumerate_sequences, BetSequence, SequenceEnd};
pub use tree::{build_game_tree, evaluate_terminal_utilities, GameTree};
