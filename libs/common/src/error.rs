//! Custom error types for the common library
//!
//! This module defines the errors raised by the remote data client,
//! whichever backend implementation is in use.

use thiserror::Error;

/// Custom error type for backend operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The HTTP request could not be sent or its body could not be read
    #[error("Backend transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// A payload could not be encoded or decoded
    #[error("Backend payload error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The realtime channel could not be opened or broke down
    #[error("Realtime channel error: {0}")]
    Realtime(String),

    /// Configuration error
    #[error("Backend configuration error: {0}")]
    Configuration(String),

    /// The operation needs a signed-in session and there is none
    #[error("No active session")]
    NoSession,
}

impl From<config::ConfigError> for StoreError {
    fn from(err: config::ConfigError) -> Self {
        StoreError::Configuration(err.to_string())
    }
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
