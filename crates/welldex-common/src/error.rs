use thiserror::Error;

/// Result type alias used across the workspace wherever a `WelldexError` is the
/// appropriate failure type.
pub type Result<T> = std::result::Result<T, WelldexError>;

#[derive(Error, Debug)]
pub enum WelldexError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request to {url} failed after {attempts} attempts: {message}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("rate limited (429) by {0}")]
    RateLimited(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("integrity check failed: {0}")]
    Integrity(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
