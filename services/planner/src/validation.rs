//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{TransactionCategory, TransactionType};

/// Longest accepted task title, in characters
pub const MAX_TITLE_LEN: usize = 120;

/// Validate task title
pub fn validate_title(title: &str) -> Result<(), String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("Title is required".to_string());
    }

    if title.chars().count() > MAX_TITLE_LEN {
        return Err(format!(
            "Title must be at most {} characters long",
            MAX_TITLE_LEN
        ));
    }

    Ok(())
}

/// Validate a 24h clock time, `HH:MM` or `HH:MM:SS`
pub fn validate_time(time: &str) -> Result<(), String> {
    static TIME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = TIME_REGEX.get_or_init(|| {
        Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9](:[0-5][0-9])?$")
            .expect("Failed to compile time regex")
    });

    if !regex.is_match(time) {
        return Err(format!("Invalid time '{}', expected HH:MM", time));
    }

    Ok(())
}

/// Validate sub-task labels
pub fn validate_sub_tasks(sub_tasks: &[String]) -> Result<(), String> {
    if sub_tasks.iter().any(|label| label.trim().is_empty()) {
        return Err("Sub-tasks cannot be blank".to_string());
    }

    Ok(())
}

/// Validate transaction item name
pub fn validate_item_name(item_name: &str) -> Result<(), String> {
    if item_name.trim().is_empty() {
        return Err("Item name is required".to_string());
    }

    Ok(())
}

/// Validate transaction amount
pub fn validate_amount(amount: f64) -> Result<(), String> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err("Amount must be a positive number".to_string());
    }

    Ok(())
}

/// Parse an amount typed into the budget form
pub fn parse_amount(text: &str) -> Result<f64, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("Amount is required".to_string());
    }

    static AMOUNT_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = AMOUNT_REGEX.get_or_init(|| {
        Regex::new(r"^[0-9]+(\.[0-9]+)?$").expect("Failed to compile amount regex")
    });

    if !regex.is_match(text) {
        return Err(format!("Invalid amount '{}'", text));
    }

    let amount = text
        .parse::<f64>()
        .map_err(|e| format!("Invalid amount '{}': {}", text, e))?;
    validate_amount(amount)?;

    Ok(amount)
}

/// Validate that a category belongs to the transaction type
pub fn validate_category(
    category: TransactionCategory,
    kind: TransactionType,
) -> Result<(), String> {
    if category.kind() != kind {
        return Err(format!(
            "Category {} is not a {:?} category",
            category, kind
        ));
    }

    Ok(())
}
