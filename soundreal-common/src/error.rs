//! Common error types for SoundReal

use thiserror::Error;

/// Common result type for SoundReal operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across SoundReal services
#[derive(Error, Debug)]
pub enum Error {
    /// Profile store error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Value that does not name a known plan
    #[error("Unknown plan type: {0}")]
    UnknownPlan(String),
}
