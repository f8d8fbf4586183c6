//! Server startup errors.

use thiserror::Error;

/// Errors raised while building or starting the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Bind address could not be parsed.
    #[error("Invalid bind address '{0}'")]
    InvalidAddress(String),

    /// Required setting missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to build the outbound HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
