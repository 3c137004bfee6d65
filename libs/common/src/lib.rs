//! Common library for the Go Girl application
//!
//! This crate is the boundary toward the hosted backend: configuration,
//! the storage/auth/realtime contract, the real HTTP client and the
//! offline stand-in used when no backend is configured.

pub mod backend;
pub mod error;
pub mod listeners;
pub mod offline;
pub mod realtime;
pub mod rest;
pub mod store;

pub use backend::{BackendConfig, connect};
pub use error::{StoreError, StoreResult};
pub use offline::{GUEST_USER_ID, OfflineClient};
pub use store::{
    AuthBackend, AuthCallback, AuthEvent, AuthSession, AuthUser, Backend, ChangeCallback,
    ChangeEvent, ChangePayload, ChannelSpec, OAuthRequest, Order, Query, RemoteStore, Subscription,
};

/// Example usage of the backend module
///
/// ```rust,no_run
/// use common::{Backend, BackendConfig, Query, RemoteStore, connect};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = BackendConfig::from_env()?;
///     let backend = connect(&config);
///     let rows = backend.select(&Query::from("tasks")).await?;
///     println!("Backend configured: {}, rows: {}", backend.is_configured(), rows.len());
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
