//! Custom error types for the authentication service

use common::StoreError;
use thiserror::Error;

/// Custom error type for authentication operations
#[derive(Error, Debug)]
pub enum AuthError {
    /// Sign-in needs a configured backend
    #[error("Sign-in is unavailable without a configured backend")]
    BackendUnavailable,

    /// An access token could not be read
    #[error("Invalid access token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    /// The session expired and could not be refreshed
    #[error("Session expired")]
    SessionExpired,

    /// The backend rejected the call
    #[error("Backend error: {0}")]
    Store(#[from] StoreError),
}

/// Type alias for authentication results
pub type AuthResult<T> = Result<T, AuthError>;
