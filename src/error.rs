//! Error types for the roster engine.

use thiserror::Error;

/// All possible errors from the roster engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Batch validation errors
    #[error("index out of range: {index} (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("count mismatch: {indices} indices but {items} items")]
    CountMismatch { indices: usize, items: usize },

    #[error("edit already in progress on this editor")]
    ReentrantEdit,

    // Persistence errors, carrying the collaborator's message
    #[error("load failed: {0}")]
    Load(String),

    #[error("save failed: {0}")]
    Save(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::IndexOutOfRange { index: 5, len: 3 };
        assert_eq!(err.to_string(), "index out of range: 5 (len 3)");

        let err = Error::CountMismatch {
            indices: 2,
            items: 3,
        };
        assert_eq!(err.to_string(), "count mismatch: 2 indices but 3 items");

        let err = Error::Save("disk full".into());
        assert_eq!(err.to_string(), "save failed: disk full");
    }
}
