//! Daily log service

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use common::{Backend, Order};

use crate::{
    error::{ServiceError, ServiceResult},
    models::{DailyLog, DailyLogDraft},
    services::entity::{Entity, EntityService},
};

impl Entity for DailyLog {
    type Draft = DailyLogDraft;

    const TABLE: &'static str = "daily_logs";
    const ORDER: Order = Order::asc("date");
    const LABEL: &'static str = "daily log";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Clone)]
pub struct DailyLogService {
    logs: EntityService<DailyLog>,
}

impl DailyLogService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            logs: EntityService::new(backend),
        }
    }

    /// Get every log of the current user, oldest first
    pub async fn get_logs(&self) -> ServiceResult<Vec<DailyLog>> {
        self.logs.list(None).await
    }

    pub async fn add_log(&self, draft: &DailyLogDraft) -> ServiceResult<Option<DailyLog>> {
        self.logs.create(draft).await
    }

    /// Save a growth-hub reflection as today's log
    pub async fn record_reflection(&self, text: &str) -> ServiceResult<Option<DailyLog>> {
        self.record_reflection_on(Local::now().date_naive(), text)
            .await
    }

    pub async fn record_reflection_on(
        &self,
        date: NaiveDate,
        text: &str,
    ) -> ServiceResult<Option<DailyLog>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::Validation(
                "Reflection cannot be blank".to_string(),
            ));
        }

        self.add_log(&DailyLogDraft::reflection(date, text)).await
    }
}
