//! Common error types for the tracker

use thiserror::Error;

/// Common result type for tracker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the tracker services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// External source unreachable or rejected the request (network, auth)
    #[error("Source error: {0}")]
    Source(String),

    /// Source returned data in an unusable shape (e.g. HTML instead of CSV)
    #[error("Malformed source payload: {0}")]
    Payload(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
