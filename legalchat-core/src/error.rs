//! Error types for legalchat-core

use thiserror::Error;

/// Main error type for the legalchat-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport-level HTTP failure (connection refused, timeout, bad body)
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Backend answered with a non-success status
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Streaming channel failure
    #[error("stream error: {0}")]
    Stream(String),

    /// Request rejected before it was sent
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for legalchat-core
pub type Result<T> = std::result::Result<T, Error>;
