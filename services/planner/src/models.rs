//! Domain models stored in the backend tables

pub mod daily_log;
pub mod profile;
pub mod task;
pub mod transaction;

pub use daily_log::{DailyLog, DailyLogDraft, REFLECTION_GLOW_POINTS};
pub use profile::UserProfile;
pub use task::{Task, TaskCategory, TaskDraft, TaskPatch};
pub use transaction::{Transaction, TransactionCategory, TransactionDraft, TransactionType};
