//! Error types for the document model

use crate::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Path not found: {0}")]
    PathNotFound(Path),

    #[error("Node at {0} is not a text leaf")]
    NotALeaf(Path),

    #[error("Node at {0} is not an element")]
    NotAnElement(Path),

    #[error("Offset {offset} out of bounds for leaf {path} of length {len}")]
    OffsetOutOfBounds { path: Path, offset: usize, len: usize },

    #[error("Invariant violation at {path}: {message}")]
    InvariantViolation { path: Path, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DocumentError {
    pub fn invariant(path: &Path, message: impl Into<String>) -> Self {
        DocumentError::InvariantViolation {
            path: path.clone(),
            message: message.into(),
        }
    }
}

pub type DocumentResult<T> = Result<T, DocumentError>;
