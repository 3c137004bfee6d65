//! Budget page controller

use std::sync::{Mutex, MutexGuard, PoisonError};

use auth::SessionContext;
use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    error::{ServiceError, ServiceResult},
    models::{Transaction, TransactionCategory, TransactionDraft, TransactionType},
    services::BudgetService,
    validation,
};

/// Input fields of the add-transaction form
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionForm {
    pub item_name: String,
    /// Amount as typed
    pub amount: String,
    pub category: TransactionCategory,
    pub kind: TransactionType,
}

impl Default for TransactionForm {
    fn default() -> Self {
        Self {
            item_name: String::new(),
            amount: String::new(),
            category: TransactionCategory::Food,
            kind: TransactionType::Debit,
        }
    }
}

impl TransactionForm {
    /// Validate the form and turn it into a draft
    pub fn to_draft(&self) -> ServiceResult<TransactionDraft> {
        validation::validate_item_name(&self.item_name).map_err(ServiceError::Validation)?;
        let amount = validation::parse_amount(&self.amount).map_err(ServiceError::Validation)?;

        let draft = TransactionDraft {
            item_name: self.item_name.trim().to_string(),
            amount,
            category: self.category,
            kind: self.kind,
        };
        draft.validate()?;
        Ok(draft)
    }

    fn clear(&mut self) {
        self.item_name.clear();
        self.amount.clear();
    }
}

/// Money in and out of the displayed ledger
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BudgetTotals {
    pub spent: f64,
    pub income: f64,
}

impl BudgetTotals {
    pub fn balance(&self) -> f64 {
        self.income - self.spent
    }
}

#[derive(Default)]
struct BudgetState {
    remote: Vec<Transaction>,
    /// Newest first, shown ahead of the remote list
    local_only: Vec<Transaction>,
    form: TransactionForm,
    loading: bool,
    submitting: bool,
}

/// Controller behind the budget view
pub struct BudgetPage {
    service: BudgetService,
    session: SessionContext,
    state: Mutex<BudgetState>,
}

impl BudgetPage {
    pub fn new(service: BudgetService, session: SessionContext) -> Self {
        Self {
            service,
            session,
            state: Mutex::new(BudgetState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, BudgetState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Displayed transactions, newest first
    pub fn transactions(&self) -> Vec<Transaction> {
        let state = self.state();
        state
            .local_only
            .iter()
            .chain(state.remote.iter())
            .cloned()
            .collect()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn is_submitting(&self) -> bool {
        self.state().submitting
    }

    pub fn form(&self) -> TransactionForm {
        self.state().form.clone()
    }

    pub fn set_item_name(&self, item_name: impl Into<String>) {
        self.state().form.item_name = item_name.into();
    }

    pub fn set_amount(&self, amount: impl Into<String>) {
        self.state().form.amount = amount.into();
    }

    /// Pick a category; the transaction type follows it
    pub fn set_category(&self, category: TransactionCategory) {
        let mut state = self.state();
        state.form.category = category;
        state.form.kind = category.kind();
    }

    /// Replace the ledger with the backend's copy
    ///
    /// Falls back to a sample ledger when the fetch fails.
    pub async fn load(&self) {
        self.state().loading = true;

        let result = self.service.get_transactions().await;

        let mut state = self.state();
        match result {
            Ok(transactions) => {
                info!("Loaded {} transaction(s)", transactions.len());
                state.remote = transactions;
            }
            Err(e) => {
                warn!("Error fetching transactions, showing sample ledger: {}", e);
                state.remote = sample_ledger(&self.session.owner_id());
            }
        }
        state.loading = false;
    }

    /// Submit the form
    ///
    /// Invalid input is returned as an error and nothing is written. A
    /// failed write keeps the transaction on this page only.
    pub async fn add_transaction(&self) -> ServiceResult<()> {
        let draft = {
            let mut state = self.state();
            let draft = state.form.to_draft()?;
            state.submitting = true;
            draft
        };

        let result = self.service.add_transaction(&draft).await;

        match result {
            Ok(Some(created)) => {
                info!("Added transaction {}", created.id);
                self.state().form.clear();
                self.load().await;
            }
            Ok(None) => {
                info!(
                    "Backend kept no row for {}, keeping it local",
                    draft.item_name
                );
                let mut state = self.state();
                state.form.clear();
                let local = self.local_record(draft);
                state.local_only.insert(0, local);
            }
            Err(e) => {
                error!("Error adding transaction: {}", e);
                let local = self.local_record(draft);
                self.state().local_only.insert(0, local);
            }
        }

        self.state().submitting = false;
        Ok(())
    }

    fn local_record(&self, draft: TransactionDraft) -> Transaction {
        draft.into_transaction(
            Uuid::new_v4().to_string(),
            self.session.owner_id(),
            Utc::now(),
        )
    }

    pub fn totals(&self) -> BudgetTotals {
        self.transactions()
            .iter()
            .fold(BudgetTotals::default(), |mut totals, transaction| {
                match transaction.kind {
                    TransactionType::Debit => totals.spent += transaction.amount,
                    TransactionType::Credit => totals.income += transaction.amount,
                }
                totals
            })
    }

    /// Spending per debit category
    pub fn category_totals(&self) -> Vec<(TransactionCategory, f64)> {
        let transactions = self.transactions();
        TransactionCategory::DEBIT
            .iter()
            .map(|category| {
                let total = transactions
                    .iter()
                    .filter(|t| t.is_debit() && t.category == *category)
                    .map(|t| t.amount)
                    .sum();
                (*category, total)
            })
            .collect()
    }

    /// Share of total spending per debit category, in percent
    pub fn breakdown(&self) -> Vec<(TransactionCategory, f64)> {
        let spent = self.totals().spent;
        self.category_totals()
            .into_iter()
            .map(|(category, total)| {
                let share = if spent > 0.0 {
                    total / spent * 100.0
                } else {
                    0.0
                };
                (category, share)
            })
            .collect()
    }
}

/// Ledger shown when the backend cannot be read
pub fn sample_ledger(owner_id: &str) -> Vec<Transaction> {
    let now = Utc::now();
    [
        ("Supermarket", 120.0, TransactionCategory::Food),
        ("Rent", 800.0, TransactionCategory::Accommodation),
        ("Electricity", 65.0, TransactionCategory::Bills),
        ("Face Clean", 45.0, TransactionCategory::SelfCare),
        ("React Course", 99.0, TransactionCategory::Learning),
    ]
    .into_iter()
    .enumerate()
    .map(|(index, (item_name, amount, category))| {
        TransactionDraft::new(item_name, amount, category).into_transaction(
            format!("sample-{}", index + 1),
            owner_id,
            now,
        )
    })
    .collect()
}
