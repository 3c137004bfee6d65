//! Daily glow logs
//!
//! Reflections from the growth hub are stored as regular daily logs,
//! with the reflection text in `learning_log`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Points awarded for a saved reflection
pub const REFLECTION_GLOW_POINTS: u32 = 10;

/// Row of the `daily_logs` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLog {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub glow_points: u32,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub learning_log: Option<String>,
    #[serde(default)]
    pub code_snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLogDraft {
    pub date: NaiveDate,
    pub glow_points: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_log: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
}

impl DailyLogDraft {
    pub fn reflection(date: NaiveDate, text: impl Into<String>) -> Self {
        Self {
            date,
            glow_points: REFLECTION_GLOW_POINTS,
            mood: None,
            learning_log: Some(text.into()),
            code_snippet: None,
        }
    }
}
