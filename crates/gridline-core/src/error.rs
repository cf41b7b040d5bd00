//! Error types for Gridline

use thiserror::Error;

/// Core error type for Gridline operations
#[derive(Error, Debug)]
pub enum GridlineError {
    /// Transport-level failure reaching the collection endpoint
    #[error("Network error: {0}")]
    Network(String),

    /// The fetch deadline elapsed before the endpoint responded
    #[error("Timeout after {0} ms")]
    Timeout(u64),

    /// The endpoint answered with a non-success status
    #[error("Server error: status {status}")]
    Server { status: u16 },

    /// The payload arrived but is missing expected keys
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Gridline operations
pub type Result<T> = std::result::Result<T, GridlineError>;
