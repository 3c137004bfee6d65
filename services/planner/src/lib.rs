//! Go Girl planner
//!
//! Domain models, the entity services that read and write them through
//! the backend, and the page controllers that keep the in-memory view
//! of each screen in sync with it.

pub mod error;
pub mod models;
pub mod pages;
pub mod services;
pub mod state;
pub mod validation;

pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
