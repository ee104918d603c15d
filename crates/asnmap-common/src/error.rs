//! Error types shared across the workspace

use thiserror::Error;

/// Result type alias for asnmap operations
pub type Result<T> = std::result::Result<T, AsnMapError>;

/// Main error type for the shared library
#[derive(Error, Debug)]
pub enum AsnMapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid list field {field}: {message}")]
    ListCodec { field: String, message: String },

    #[error("Unknown entity kind: {0}")]
    UnknownKind(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
