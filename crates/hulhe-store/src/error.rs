use std::fmt;

/// InfoSet dimension-mismatch and related store precondition violations.
/// These never fire on traversals that build their own records via
/// `get_or_create`, only when a caller hand-constructs an update with a
/// mismatched action count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    DimensionMismatch {
        id_len: usize,
        expected: usize,
        got: usize,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DimensionMismatch {
                id_len,
                expected,
                got,
            } => write!(
                f,
                "infoset update dimension mismatch (id length {id_len}): expected {expected} actions, got {got}"
            ),
        }
    }
}

impl std::error::Error for StoreError {}
