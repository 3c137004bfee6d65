//! Budget service

use std::sync::Arc;

use common::{AuthUser, Backend, ChangeCallback, Order, Subscription};

use crate::{
    error::ServiceResult,
    models::{Transaction, TransactionDraft},
    services::entity::{Entity, EntityService},
};

impl Entity for Transaction {
    type Draft = TransactionDraft;

    const TABLE: &'static str = "transactions";
    const ORDER: Order = Order::desc("created_at");
    const LABEL: &'static str = "transaction";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Budget service for ledger operations
#[derive(Clone)]
pub struct BudgetService {
    transactions: EntityService<Transaction>,
}

impl BudgetService {
    /// Create a new budget service
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            transactions: EntityService::new(backend),
        }
    }

    pub async fn current_user(&self) -> ServiceResult<AuthUser> {
        self.transactions.current_user().await
    }

    /// Get the current user's transactions, newest first
    pub async fn get_transactions(&self) -> ServiceResult<Vec<Transaction>> {
        self.transactions.list(None).await
    }

    pub async fn add_transaction(
        &self,
        draft: &TransactionDraft,
    ) -> ServiceResult<Option<Transaction>> {
        draft.validate()?;
        self.transactions.create(draft).await
    }

    /// Follow changes to the ledger of `user_id`
    pub async fn subscribe_to_budget(
        &self,
        user_id: &str,
        on_change: ChangeCallback,
    ) -> ServiceResult<Subscription> {
        self.transactions.subscribe(user_id, on_change).await
    }
}
