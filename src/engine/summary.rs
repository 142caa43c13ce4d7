use rust_decimal::Decimal;

use crate::models::MonthKey;

/// Budget vs. actual for one category in one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SummaryRow {
    pub(crate) category_id: i64,
    pub(crate) name: String,
    pub(crate) budgeted: Decimal,
    pub(crate) spent: Decimal,
    /// `budgeted - spent`; negative when the category is overspent.
    pub(crate) delta: Decimal,
}

impl SummaryRow {
    pub(crate) fn new(category_id: i64, name: String, budgeted: Decimal, spent: Decimal) -> Self {
        Self {
            category_id,
            name,
            budgeted,
            spent,
            delta: budgeted - spent,
        }
    }

    pub(crate) fn is_overspent(&self) -> bool {
        self.delta < Decimal::ZERO
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MonthSummary {
    pub(crate) key: MonthKey,
    pub(crate) overall: Decimal,
    pub(crate) categorized: Decimal,
    pub(crate) remaining: Decimal,
    pub(crate) over_budget: Decimal,
    pub(crate) total_spent: Decimal,
    pub(crate) rows: Vec<SummaryRow>,
}
