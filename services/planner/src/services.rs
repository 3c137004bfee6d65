//! Entity services over the remote store
//!
//! Every read and write is scoped to the signed-in user. Failures are
//! logged where they happen and handed back to the caller.

pub mod budget;
pub mod daily_log;
pub mod entity;
pub mod task;

pub use budget::BudgetService;
pub use daily_log::DailyLogService;
pub use entity::{Entity, EntityService};
pub use task::TaskService;
