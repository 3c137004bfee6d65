//! Page controllers
//!
//! Each controller owns the in-memory state of one view and talks to the
//! backend through the entity services.

pub mod board;
pub mod budget;
pub mod growth;
pub mod profile;
pub mod tasks;

pub use board::{BoardEntry, CompletionTarget, SyncState, TaskBoard};
pub use budget::{BudgetPage, BudgetTotals, TransactionForm};
pub use growth::{FocusTimer, GrowthHub};
pub use profile::{GlowIntensity, HeatmapCell, ProfilePage};
pub use tasks::TasksPage;
