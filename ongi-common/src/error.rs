//! Common error types for Ongi

use thiserror::Error;

/// Common result type for Ongi operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Ongi services
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

    /// Requested resource not found (or expired)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation conflicts with current state (e.g. re-linking a session)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
