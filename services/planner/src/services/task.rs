//! Task service

use std::sync::Arc;

use chrono::NaiveDate;
use common::{AuthUser, Backend, ChangeCallback, Order, Subscription};

use crate::{
    error::ServiceResult,
    models::{Task, TaskDraft, TaskPatch},
    services::entity::{Entity, EntityService},
};

impl Entity for Task {
    type Draft = TaskDraft;

    const TABLE: &'static str = "tasks";
    const ORDER: Order = Order::asc("start_time");
    const LABEL: &'static str = "task";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Task service for planner operations
#[derive(Clone)]
pub struct TaskService {
    tasks: EntityService<Task>,
}

impl TaskService {
    /// Create a new task service
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            tasks: EntityService::new(backend),
        }
    }

    pub async fn current_user(&self) -> ServiceResult<AuthUser> {
        self.tasks.current_user().await
    }

    /// Get the current user's tasks for `date`, earliest start first
    pub async fn get_tasks(&self, date: NaiveDate) -> ServiceResult<Vec<Task>> {
        let date = date.format("%Y-%m-%d").to_string();
        self.tasks.list(Some(("date", &date))).await
    }

    /// Add a task for the current user
    pub async fn add_task(&self, draft: &TaskDraft) -> ServiceResult<Option<Task>> {
        draft.validate()?;
        self.tasks.create(draft).await
    }

    pub async fn update_task(&self, id: &str, patch: &TaskPatch) -> ServiceResult<Option<Task>> {
        self.tasks.update(id, patch).await
    }

    /// Mark a task done
    pub async fn complete_task(&self, id: &str) -> ServiceResult<Option<Task>> {
        self.update_task(id, &TaskPatch::completed()).await
    }

    pub async fn delete_task(&self, id: &str) -> ServiceResult<()> {
        self.tasks.delete(id).await
    }

    /// Follow changes to the tasks of `user_id`
    pub async fn subscribe_to_tasks(
        &self,
        user_id: &str,
        on_change: ChangeCallback,
    ) -> ServiceResult<Subscription> {
        self.tasks.subscribe(user_id, on_change).await
    }
}
