//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Document error: {0}")]
    Document(#[from] quire_document::DocumentError),

    #[error("{0}")]
    InvalidUrl(#[from] InvalidUrl),

    #[error("No selection")]
    NoSelection,

    #[error("Unknown format: {0}")]
    UnknownFormat(#[from] quire_document::UnknownFormat),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Why a string was rejected as an image URL
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidUrl {
    #[error("Not an absolute URL: {0}")]
    Unparseable(String),

    #[error("URL has no file extension: {0}")]
    MissingExtension(String),

    #[error("Unsupported image extension '{extension}' in {url}")]
    UnsupportedExtension { url: String, extension: String },
}

pub type EditorResult<T> = Result<T, EditorError>;
