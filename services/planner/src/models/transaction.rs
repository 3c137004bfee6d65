//! Budget models

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ServiceError, ServiceResult},
    validation,
};

/// Direction of money movement; amounts themselves are never negative
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Credit,
    #[default]
    Debit,
}

/// Ledger categories, split into spending and income labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionCategory {
    Food,
    Accommodation,
    Bills,
    #[serde(rename = "Self-Care")]
    SelfCare,
    Learning,
    Salary,
    Freelance,
    Gift,
}

impl TransactionCategory {
    pub const DEBIT: [TransactionCategory; 5] = [
        TransactionCategory::Food,
        TransactionCategory::Accommodation,
        TransactionCategory::Bills,
        TransactionCategory::SelfCare,
        TransactionCategory::Learning,
    ];

    pub const CREDIT: [TransactionCategory; 3] = [
        TransactionCategory::Salary,
        TransactionCategory::Freelance,
        TransactionCategory::Gift,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionCategory::Food => "Food",
            TransactionCategory::Accommodation => "Accommodation",
            TransactionCategory::Bills => "Bills",
            TransactionCategory::SelfCare => "Self-Care",
            TransactionCategory::Learning => "Learning",
            TransactionCategory::Salary => "Salary",
            TransactionCategory::Freelance => "Freelance",
            TransactionCategory::Gift => "Gift",
        }
    }

    /// The transaction type this category belongs to
    pub fn kind(&self) -> TransactionType {
        if Self::CREDIT.contains(self) {
            TransactionType::Credit
        } else {
            TransactionType::Debit
        }
    }
}

impl fmt::Display for TransactionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row of the `transactions` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub item_name: String,
    pub amount: f64,
    pub category: TransactionCategory,
    #[serde(rename = "type", default)]
    pub kind: TransactionType,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_debit(&self) -> bool {
        self.kind == TransactionType::Debit
    }
}

/// A transaction as submitted from the budget form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub item_name: String,
    pub amount: f64,
    pub category: TransactionCategory,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

impl TransactionDraft {
    /// Build a draft whose type follows from its category
    pub fn new(item_name: impl Into<String>, amount: f64, category: TransactionCategory) -> Self {
        Self {
            item_name: item_name.into(),
            amount,
            category,
            kind: category.kind(),
        }
    }

    pub fn validate(&self) -> ServiceResult<()> {
        validation::validate_item_name(&self.item_name)
            .and_then(|_| validation::validate_amount(self.amount))
            .and_then(|_| validation::validate_category(self.category, self.kind))
            .map_err(ServiceError::Validation)
    }

    pub fn into_transaction(
        self,
        id: impl Into<String>,
        user_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Transaction {
        Transaction {
            id: id.into(),
            user_id: user_id.into(),
            item_name: self.item_name,
            amount: self.amount,
            category: self.category,
            kind: self.kind,
            created_at,
        }
    }
}
