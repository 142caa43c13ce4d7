//! Whole-database JSON export/import and per-month CSV export.
//!
//! The JSON document carries three arrays (`categories`, `expenses`,
//! `budgets`) with camelCase fields, amounts as plain JSON numbers, and
//! expense dates as `yyyy-MM-dd HH:mm:ss`. Budget mappings are objects keyed
//! by the stringified category id.

use anyhow::{Context, Result};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use crate::db::Database;
use crate::models::amount::{format_amount, is_storable_amount};
use crate::models::{BudgetRecord, Category, CategoryBudgets, Expense, MonthKey};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BudgetData {
    #[serde(default)]
    categories: Vec<CategoryEntry>,
    #[serde(default)]
    expenses: Vec<ExpenseEntry>,
    #[serde(default)]
    budgets: Vec<BudgetEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryEntry {
    id: i64,
    name: String,
    #[serde(default)]
    usage_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpenseEntry {
    id: i64,
    amount: f64,
    date: String,
    category_id: i64,
    // older exports called this field "description"
    #[serde(default, alias = "description")]
    note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BudgetEntry {
    id: i64,
    month: u32,
    year: i32,
    overall_budget: f64,
    #[serde(default)]
    category_budgets: BTreeMap<String, f64>,
}

/// Row counts moved by an export or import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct TransferCounts {
    pub(crate) categories: usize,
    pub(crate) expenses: usize,
    pub(crate) budgets: usize,
}

impl std::fmt::Display for TransferCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} categories, {} expenses, {} budgets",
            self.categories, self.expenses, self.budgets
        )
    }
}

fn to_number(amount: Decimal) -> f64 {
    amount.round_dp(2).to_f64().unwrap_or_default()
}

/// Two-decimal amount, or `None` when the value is not a storable amount.
fn from_number(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(2))
        .filter(|d| is_storable_amount(*d))
}

// ── JSON ──────────────────────────────────────────────────────

pub(crate) fn export_json(db: &Database, path: &Path) -> Result<TransferCounts> {
    let categories = db.get_categories()?;
    let expenses = db.get_all_expenses()?;
    let budgets = db.get_all_budget_records()?;

    let data = BudgetData {
        categories: categories
            .iter()
            .filter_map(|c| {
                Some(CategoryEntry {
                    id: c.id?,
                    name: c.name.clone(),
                    usage_count: c.usage_count,
                })
            })
            .collect(),
        expenses: expenses
            .iter()
            .filter_map(|e| {
                Some(ExpenseEntry {
                    id: e.id?,
                    amount: to_number(e.amount),
                    date: e.date_string(),
                    category_id: e.category_id,
                    note: e.note.clone(),
                })
            })
            .collect(),
        budgets: budgets
            .iter()
            .filter_map(|b| {
                Some(BudgetEntry {
                    id: b.id?,
                    month: b.key.month(),
                    year: b.key.year(),
                    overall_budget: to_number(b.overall_budget),
                    category_budgets: b
                        .category_budgets
                        .iter()
                        .map(|(id, amount)| (id.to_string(), to_number(amount)))
                        .collect(),
                })
            })
            .collect(),
    };

    let counts = TransferCounts {
        categories: data.categories.len(),
        expenses: data.expenses.len(),
        budgets: data.budgets.len(),
    };
    let json = serde_json::to_string_pretty(&data).context("Failed to encode export")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write export: {}", path.display()))?;

    info!(path = %path.display(), %counts, "exported data");
    Ok(counts)
}

/// Replace everything in `db` with the contents of the JSON file at `path`.
/// Nothing is changed unless the whole file is read and stored.
pub(crate) fn import_json(db: &mut Database, path: &Path) -> Result<TransferCounts> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read import: {}", path.display()))?;
    let data: BudgetData = serde_json::from_str(&text)
        .with_context(|| format!("Not a budget export: {}", path.display()))?;

    let (categories, expenses, budgets) = into_models(data)?;
    db.replace_all(&categories, &expenses, &budgets)
        .context("Import failed, existing data kept")?;

    let counts = TransferCounts {
        categories: categories.len(),
        expenses: expenses.len(),
        budgets: budgets.len(),
    };
    info!(path = %path.display(), %counts, "imported data");
    Ok(counts)
}

fn into_models(data: BudgetData) -> Result<(Vec<Category>, Vec<Expense>, Vec<BudgetRecord>)> {
    let categories: Vec<Category> = data
        .categories
        .into_iter()
        .map(|c| Category {
            id: Some(c.id),
            name: c.name.trim().to_string(),
            usage_count: c.usage_count.max(0),
        })
        .collect();
    let known = |id: i64| categories.iter().any(|c| c.id == Some(id));

    let mut expenses = Vec::with_capacity(data.expenses.len());
    for e in data.expenses {
        if !known(e.category_id) {
            warn!(id = e.id, category_id = e.category_id, "skipping expense for unknown category");
            continue;
        }
        let date = Expense::parse_date(&e.date)
            .with_context(|| format!("Expense {} has an invalid date: {}", e.id, e.date))?;
        let amount = from_number(e.amount)
            .with_context(|| format!("Expense {} has an invalid amount", e.id))?;
        let mut expense = Expense::new(e.category_id, amount, date, e.note);
        expense.id = Some(e.id);
        expenses.push(expense);
    }

    let mut budgets = Vec::with_capacity(data.budgets.len());
    for b in data.budgets {
        let key = MonthKey::new(b.month, b.year)
            .with_context(|| format!("Budget {} has an invalid month: {}/{}", b.id, b.month, b.year))?;
        let overall = from_number(b.overall_budget)
            .with_context(|| format!("Budget {} has an invalid total", b.id))?;

        let mut mapping = CategoryBudgets::new();
        for (id, amount) in b.category_budgets {
            let Ok(category_id) = id.parse::<i64>() else {
                warn!(budget = b.id, key = %id, "skipping non-numeric category key");
                continue;
            };
            if !known(category_id) {
                warn!(budget = b.id, category_id, "dropping budget entry for unknown category");
                continue;
            }
            let amount = from_number(amount)
                .with_context(|| format!("Budget {} has an invalid amount for category {id}", b.id))?;
            mapping.set(category_id, amount);
        }

        if mapping.total() > overall {
            anyhow::bail!(
                "Budget {} allocates {} to categories, more than its total {}",
                b.id,
                format_amount(mapping.total()),
                format_amount(overall)
            );
        }

        let mut record = BudgetRecord::new(key, overall, mapping);
        record.id = Some(b.id);
        budgets.push(record);
    }

    Ok((categories, expenses, budgets))
}

// ── CSV ───────────────────────────────────────────────────────

/// Write one month's expenses as `date,category,amount,note`. Returns the
/// number of rows written.
pub(crate) fn export_csv(db: &Database, key: MonthKey, path: &Path) -> Result<usize> {
    let categories = db.get_categories()?;
    let expenses = db.get_expenses_for_month(key)?;

    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV: {}", path.display()))?;
    wtr.write_record(["date", "category", "amount", "note"])?;
    for expense in &expenses {
        let category = Category::find_by_id(&categories, expense.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("");
        wtr.write_record([
            expense.date_string().as_str(),
            category,
            format_amount(expense.amount).as_str(),
            expense.note.as_deref().unwrap_or(""),
        ])?;
    }
    wtr.flush()
        .with_context(|| format!("Failed to write CSV: {}", path.display()))?;

    info!(path = %path.display(), month = %key, rows = expenses.len(), "exported CSV");
    Ok(expenses.len())
}
