pub(crate) mod amount;
mod budget;
mod category;
mod expense;
mod month;

pub(crate) use budget::{BudgetRecord, CategoryBudgets};
pub(crate) use category::{
    arrange_stats, sort_categories, Category, CategoryOrder, CategoryStats, StatsSort,
    CATEGORY_NAME_MAX_LENGTH,
};
pub(crate) use expense::{Expense, EXPENSE_DATE_FORMAT, EXPENSE_NOTE_MAX_LENGTH};
pub(crate) use month::{MonthKey, MAX_YEAR, MIN_YEAR};

#[cfg(test)]
mod tests;
