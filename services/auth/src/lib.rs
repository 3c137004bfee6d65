//! Authentication for the Go Girl application
//!
//! OAuth sign-in with PKCE, session restore and sign-out on top of the
//! backend auth contract, plus the process-wide [`SessionContext`] that
//! page controllers read the signed-in user from.

pub mod error;
pub mod jwt;
pub mod oauth;
pub mod service;
pub mod session;

pub use error::{AuthError, AuthResult};
pub use oauth::{OAuthProvider, PendingSignIn};
pub use service::AuthService;
pub use session::SessionContext;
