//! Task models

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    error::{ServiceError, ServiceResult},
    validation,
};

/// Fixed set of task labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskCategory {
    Study,
    Meeting,
    Travelling,
    Work,
    Health,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 5] = [
        TaskCategory::Study,
        TaskCategory::Meeting,
        TaskCategory::Travelling,
        TaskCategory::Work,
        TaskCategory::Health,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Study => "Study",
            TaskCategory::Meeting => "Meeting",
            TaskCategory::Travelling => "Travelling",
            TaskCategory::Work => "Work",
            TaskCategory::Health => "Health",
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task row of the `tasks` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    /// `HH:MM` or `HH:MM:SS`
    pub start_time: String,
    pub end_time: String,
    pub date: NaiveDate,
    pub category: TaskCategory,
    #[serde(default)]
    pub is_reminder_on: bool,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sub_tasks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A task as submitted from the creation sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub date: NaiveDate,
    pub category: TaskCategory,
    #[serde(default)]
    pub is_reminder_on: bool,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub sub_tasks: Vec<String>,
}

impl TaskDraft {
    pub fn new(
        title: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
        date: NaiveDate,
        category: TaskCategory,
    ) -> Self {
        Self {
            title: title.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            date,
            category,
            is_reminder_on: false,
            is_completed: false,
            sub_tasks: Vec::new(),
        }
    }

    pub fn with_reminder(mut self, on: bool) -> Self {
        self.is_reminder_on = on;
        self
    }

    pub fn with_sub_tasks(mut self, sub_tasks: Vec<String>) -> Self {
        self.sub_tasks = sub_tasks;
        self
    }

    /// Check the draft before it is applied anywhere
    pub fn validate(&self) -> ServiceResult<()> {
        validation::validate_title(&self.title)
            .and_then(|_| validation::validate_time(&self.start_time))
            .and_then(|_| validation::validate_time(&self.end_time))
            .and_then(|_| validation::validate_sub_tasks(&self.sub_tasks))
            .map_err(ServiceError::Validation)
    }

    /// Materialize the draft as a task owned by `user_id`
    pub fn into_task(self, id: impl Into<String>, user_id: impl Into<String>) -> Task {
        Task {
            id: id.into(),
            user_id: user_id.into(),
            title: self.title,
            start_time: self.start_time,
            end_time: self.end_time,
            date: self.date,
            category: self.category,
            is_reminder_on: self.is_reminder_on,
            is_completed: self.is_completed,
            sub_tasks: self.sub_tasks,
            created_at: None,
        }
    }
}

/// Partial update of a task; unset fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<TaskCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_reminder_on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_tasks: Option<Vec<String>>,
}

impl TaskPatch {
    /// Patch that marks a task done
    pub fn completed() -> Self {
        Self {
            is_completed: Some(true),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fold a later patch into this one; fields set in `later` win
    pub fn merge(&mut self, later: TaskPatch) {
        self.title = later.title.or(self.title.take());
        self.start_time = later.start_time.or(self.start_time.take());
        self.end_time = later.end_time.or(self.end_time.take());
        self.date = later.date.or(self.date);
        self.category = later.category.or(self.category);
        self.is_reminder_on = later.is_reminder_on.or(self.is_reminder_on);
        self.is_completed = later.is_completed.or(self.is_completed);
        self.sub_tasks = later.sub_tasks.or(self.sub_tasks.take());
    }

    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(start_time) = &self.start_time {
            task.start_time = start_time.clone();
        }
        if let Some(end_time) = &self.end_time {
            task.end_time = end_time.clone();
        }
        if let Some(date) = self.date {
            task.date = date;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(on) = self.is_reminder_on {
            task.is_reminder_on = on;
        }
        if let Some(done) = self.is_completed {
            task.is_completed = done;
        }
        if let Some(sub_tasks) = &self.sub_tasks {
            task.sub_tasks = sub_tasks.clone();
        }
    }
}
