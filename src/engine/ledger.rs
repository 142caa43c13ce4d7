use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use super::{BudgetError, BudgetResult};
use crate::models::amount::parse_amount;
use crate::models::{Category, Expense, EXPENSE_NOTE_MAX_LENGTH};

/// Validate a new expense entry against the live category list.
pub(crate) fn new_expense(
    categories: &[Category],
    category_id: i64,
    amount_input: &str,
    date: NaiveDateTime,
    note: Option<&str>,
) -> BudgetResult<Expense> {
    if Category::find_by_id(categories, category_id).is_none() {
        return Err(BudgetError::UnknownCategory(category_id));
    }

    let amount = parse_amount(amount_input)
        .filter(|a| *a > Decimal::ZERO)
        .ok_or(BudgetError::InvalidAmount)?;

    if note.is_some_and(|n| n.trim().chars().count() > EXPENSE_NOTE_MAX_LENGTH) {
        return Err(BudgetError::InvalidNote);
    }

    Ok(Expense::new(
        category_id,
        amount,
        date,
        note.map(str::to_string),
    ))
}
