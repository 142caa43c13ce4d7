use anyhow::Result;
use rust_decimal::Decimal;

use crate::models::{BudgetRecord, Category, MonthKey};

/// Persistence the budget engine depends on. Calls may block on I/O; the
/// engine's own validation never does.
pub(crate) trait BudgetStore {
    /// All categories, ordered by name.
    fn list_categories(&self) -> Result<Vec<Category>>;

    fn get_budget_record(&self, key: MonthKey) -> Result<Option<BudgetRecord>>;

    /// Upsert by month/year. The overall amount and the whole mapping are
    /// replaced together or not at all. Returns the record id.
    fn save_budget_record(&mut self, record: &BudgetRecord) -> Result<i64>;

    fn sum_expenses_for_month(&self, category_id: i64, key: MonthKey) -> Result<Decimal>;

    fn create_category(&mut self, name: &str) -> Result<i64>;

    fn rename_category(&mut self, id: i64, name: &str) -> Result<()>;

    /// Delete a category together with its expenses and every budget mapping
    /// entry that references it. Returns the number of expenses removed.
    fn delete_category(&mut self, id: i64) -> Result<usize>;
}
