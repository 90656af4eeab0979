//! Error types for observable collections

use std::fmt;

use thiserror::Error;

use crate::ChangeKind;

/// A single listener that panicked while a change was being delivered
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenerFailure {
    /// Position of the listener in the dispatch snapshot
    pub position: usize,
    /// Panic payload rendered as text
    pub message: String,
}

impl fmt::Display for ListenerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener #{}: {}", self.position, self.message)
    }
}

/// Observable collection errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    #[error("Index out of bounds: index {index}, len {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Invalid range: {start}..{end} for len {len}")]
    InvalidRange { start: usize, end: usize, len: usize },

    /// The mutation committed, but one or more listeners panicked while the
    /// change was being delivered. Every listener was still attempted.
    #[error("{} listener(s) panicked while handling {change}", failures.len())]
    ListenerPanicked {
        change: ChangeKind,
        failures: Vec<ListenerFailure>,
    },
}

impl ListError {
    /// True when the failed call still changed the store
    pub fn is_committed(&self) -> bool {
        matches!(self, ListError::ListenerPanicked { .. })
    }
}

/// Result type for observable collection operations
pub type ListResult<T> = Result<T, ListError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_error_display() {
        let err = ListError::IndexOutOfBounds { index: 4, len: 2 };
        assert_eq!(err.to_string(), "Index out of bounds: index 4, len 2");
        assert!(!err.is_committed());
    }

    #[test]
    fn test_listener_panicked_display() {
        let err = ListError::ListenerPanicked {
            change: ChangeKind::ItemAdded,
            failures: vec![
                ListenerFailure {
                    position: 0,
                    message: "boom".into(),
                },
                ListenerFailure {
                    position: 2,
                    message: "bang".into(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "2 listener(s) panicked while handling item-added"
        );
        assert!(err.is_committed());
    }
}
