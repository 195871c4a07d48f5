//! Error types for the streaming chat client

use thiserror::Error;

/// Chat client error types
#[derive(Error, Debug)]
pub enum ChatError {
    /// The completion endpoint answered with a non-success status before any
    /// streaming began. `message` carries the reason extracted from the error
    /// body when one was parseable.
    #[error("request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    /// The transport failed while reading the response body. Partial text
    /// emitted before the failure is not rolled back.
    #[error("stream read failed: {0}")]
    StreamRead(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for chat operations
pub type Result<T> = std::result::Result<T, ChatError>;
