//! Top-level error types.

use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Startup configuration failures. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{name} must be an integer, got {value:?}")]
    InvalidInteger { name: &'static str, value: String },

    #[error("{name} must be a float, got {value:?}")]
    InvalidFloat { name: &'static str, value: String },
}

/// Completion collaborator failures. Recoverable per message.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("completion API error ({status}): {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("completion API rate limited: {0}")]
    RateLimited(String),

    #[error("completion timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("empty completion response")]
    EmptyResponse,
}
