//! Application state shared across page controllers

use std::sync::Arc;

use auth::{AuthService, SessionContext};
use chrono::NaiveDate;
use common::{Backend, BackendConfig, connect};

use crate::{
    models::UserProfile,
    pages::{BudgetPage, GrowthHub, ProfilePage, TasksPage},
    services::{BudgetService, DailyLogService, TaskService},
};

/// Application state shared across page controllers
#[derive(Clone)]
pub struct AppState {
    pub config: BackendConfig,
    pub backend: Arc<dyn Backend>,
    pub auth: AuthService,
    pub session: SessionContext,
    pub task_service: TaskService,
    pub budget_service: BudgetService,
    pub daily_log_service: DailyLogService,
}

impl AppState {
    /// Connect to the configured backend, or run offline without one
    pub async fn init(config: BackendConfig) -> Self {
        let backend = connect(&config);
        Self::with_backend(config, backend).await
    }

    pub async fn with_backend(config: BackendConfig, backend: Arc<dyn Backend>) -> Self {
        let auth = AuthService::new(Arc::clone(&backend), config.redirect_url());
        let session = SessionContext::init(auth.clone()).await;

        Self {
            task_service: TaskService::new(Arc::clone(&backend)),
            budget_service: BudgetService::new(Arc::clone(&backend)),
            daily_log_service: DailyLogService::new(Arc::clone(&backend)),
            config,
            backend,
            auth,
            session,
        }
    }

    pub fn tasks_page(&self, date: NaiveDate) -> TasksPage {
        TasksPage::new(self.task_service.clone(), self.session.clone(), date)
    }

    pub fn budget_page(&self) -> BudgetPage {
        BudgetPage::new(self.budget_service.clone(), self.session.clone())
    }

    pub fn profile_page(&self, profile: UserProfile) -> ProfilePage {
        ProfilePage::new(self.daily_log_service.clone(), profile)
    }

    pub fn growth_hub(&self) -> GrowthHub {
        GrowthHub::new(self.daily_log_service.clone())
    }

    /// Stop following auth state changes
    pub fn teardown(&self) {
        self.session.teardown();
    }
}
