//! Error types for the planner services

use common::StoreError;
use thiserror::Error;

/// Error type for entity services and page controllers
#[derive(Error, Debug)]
pub enum ServiceError {
    /// No active session for an operation that needs one
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The backend failed a read
    #[error("Fetch failed: {0}")]
    FetchFailed(#[source] StoreError),

    /// The backend failed a write
    #[error("Write failed: {0}")]
    WriteFailed(#[source] StoreError),

    /// The realtime channel could not be established
    #[error("Subscription failed: {0}")]
    SubscriptionFailed(#[source] StoreError),

    /// Rejected input, caught before anything is applied
    #[error("Invalid input: {0}")]
    Validation(String),
}

impl ServiceError {
    /// Whether signing in again could fix this failure
    pub fn needs_sign_in(&self) -> bool {
        matches!(self, ServiceError::AuthenticationRequired)
    }
}

/// Type alias for service results
pub type ServiceResult<T> = Result<T, ServiceError>;
