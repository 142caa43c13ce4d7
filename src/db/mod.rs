mod schema;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::engine::BudgetStore;
use crate::models::amount::format_amount;
use crate::models::*;

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        debug!(path = %path.display(), "opened database");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            info!(version = schema::CURRENT_VERSION, "created database schema");
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
            info!(from = current, to = schema::CURRENT_VERSION, "migrated database");
        }

        Ok(())
    }

    // ── Categories ────────────────────────────────────────────

    pub(crate) fn get_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, usage_count FROM categories ORDER BY name COLLATE NOCASE")?;
        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: Some(row.get(0)?),
                name: row.get(1)?,
                usage_count: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    #[cfg(test)]
    pub(crate) fn get_category_by_id(&self, id: i64) -> Result<Option<Category>> {
        let category = self
            .conn
            .query_row(
                "SELECT id, name, usage_count FROM categories WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Category {
                        id: Some(row.get(0)?),
                        name: row.get(1)?,
                        usage_count: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(category)
    }

    pub(crate) fn insert_category(&self, cat: &Category) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO categories (name, usage_count) VALUES (?1, ?2)",
                params![cat.name, cat.usage_count],
            )
            .with_context(|| format!("Failed to create category '{}'", cat.name))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Expense count and all-time spend per category.
    pub(crate) fn get_category_stats(&self) -> Result<Vec<CategoryStats>> {
        let mut totals: BTreeMap<i64, (i64, Decimal)> = BTreeMap::new();
        for (category_id, amount) in self.expense_amounts("SELECT category_id, amount FROM expenses", [])? {
            let entry = totals.entry(category_id).or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            entry.1 += amount;
        }

        Ok(self
            .get_categories()?
            .into_iter()
            .map(|category| {
                let (expense_count, total_spent) = category
                    .id
                    .and_then(|id| totals.get(&id).copied())
                    .unwrap_or((0, Decimal::ZERO));
                CategoryStats {
                    category,
                    expense_count,
                    total_spent,
                }
            })
            .collect())
    }

    // ── Expenses ──────────────────────────────────────────────

    /// Insert an expense and bump its category's usage counter together.
    pub(crate) fn insert_expense(&mut self, expense: &Expense) -> Result<i64> {
        let tx = self.conn.transaction()?;
        let id = insert_expense_row(&tx, expense)?;
        let updated = tx.execute(
            "UPDATE categories SET usage_count = usage_count + 1 WHERE id = ?1",
            params![expense.category_id],
        )?;
        if updated == 0 {
            anyhow::bail!("Category {} does not exist", expense.category_id);
        }
        tx.commit()?;
        debug!(id, category_id = expense.category_id, amount = %expense.amount, "recorded expense");
        Ok(id)
    }

    /// A month's expenses, newest first.
    pub(crate) fn get_expenses_for_month(&self, key: MonthKey) -> Result<Vec<Expense>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, category_id, amount, date, note FROM expenses
             WHERE date LIKE ?1
             ORDER BY date DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![format!("{}%", key.date_prefix())], expense_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_all_expenses(&self) -> Result<Vec<Expense>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, category_id, amount, date, note FROM expenses ORDER BY date DESC, id DESC",
        )?;
        let rows = stmt.query_map([], expense_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Returns false when no expense had that id.
    pub(crate) fn delete_expense(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM expenses WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    pub(crate) fn get_month_total(&self, key: MonthKey) -> Result<Decimal> {
        let amounts = self.expense_amounts(
            "SELECT category_id, amount FROM expenses WHERE date LIKE ?1",
            params![format!("{}%", key.date_prefix())],
        )?;
        Ok(amounts.into_iter().map(|(_, amount)| amount).sum())
    }

    /// Amounts are summed as decimals here, not by SQLite, which would go
    /// through floating point.
    fn expense_amounts<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<(i64, Decimal)>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            let category_id: i64 = row.get(0)?;
            let amt_str: String = row.get(1)?;
            Ok((category_id, Decimal::from_str(&amt_str).unwrap_or_default()))
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    // ── Budgets ───────────────────────────────────────────────

    pub(crate) fn get_all_budget_records(&self) -> Result<Vec<BudgetRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, month, year, overall_budget, category_budgets FROM budgets ORDER BY year, month",
        )?;
        let rows = stmt.query_map([], budget_row)?;
        let mut records = Vec::new();
        for row in rows {
            if let Some(record) = budget_from_row(row?)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    // ── Import ────────────────────────────────────────────────

    /// Replace every category, expense and budget record with the given
    /// set, keeping their ids. Runs as one transaction: on any failure the
    /// previous data is untouched.
    pub(crate) fn replace_all(
        &mut self,
        categories: &[Category],
        expenses: &[Expense],
        budgets: &[BudgetRecord],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch("DELETE FROM expenses; DELETE FROM budgets; DELETE FROM categories;")?;

        for cat in categories {
            tx.execute(
                "INSERT INTO categories (id, name, usage_count) VALUES (?1, ?2, ?3)",
                params![cat.id, cat.name, cat.usage_count],
            )
            .with_context(|| format!("Failed to import category '{}'", cat.name))?;
        }
        for expense in expenses {
            insert_expense_row(&tx, expense)
                .with_context(|| format!("Failed to import expense {:?}", expense.id))?;
        }
        for record in budgets {
            tx.execute(
                "INSERT INTO budgets (id, month, year, overall_budget, category_budgets)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    record.key.month(),
                    record.key.year(),
                    format_amount(record.overall_budget),
                    record.category_budgets.to_json()?,
                ],
            )
            .with_context(|| format!("Failed to import budget for {}", record.key))?;
        }

        tx.commit()?;
        info!(
            categories = categories.len(),
            expenses = expenses.len(),
            budgets = budgets.len(),
            "replaced all data"
        );
        Ok(())
    }
}

impl BudgetStore for Database {
    fn list_categories(&self) -> Result<Vec<Category>> {
        self.get_categories()
    }

    fn get_budget_record(&self, key: MonthKey) -> Result<Option<BudgetRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, month, year, overall_budget, category_budgets FROM budgets
                 WHERE month = ?1 AND year = ?2",
                params![key.month(), key.year()],
                budget_row,
            )
            .optional()?;
        match row {
            Some(row) => budget_from_row(row),
            None => Ok(None),
        }
    }

    fn save_budget_record(&mut self, record: &BudgetRecord) -> Result<i64> {
        let mapping = record.category_budgets.to_json()?;
        self.conn
            .execute(
                "INSERT INTO budgets (month, year, overall_budget, category_budgets)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(month, year) DO UPDATE SET
                     overall_budget = excluded.overall_budget,
                     category_budgets = excluded.category_budgets",
                params![
                    record.key.month(),
                    record.key.year(),
                    format_amount(record.overall_budget),
                    mapping,
                ],
            )
            .with_context(|| format!("Failed to save budget for {}", record.key))?;
        let id = self.conn.query_row(
            "SELECT id FROM budgets WHERE month = ?1 AND year = ?2",
            params![record.key.month(), record.key.year()],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn sum_expenses_for_month(&self, category_id: i64, key: MonthKey) -> Result<Decimal> {
        let amounts = self.expense_amounts(
            "SELECT category_id, amount FROM expenses WHERE category_id = ?1 AND date LIKE ?2",
            params![category_id, format!("{}%", key.date_prefix())],
        )?;
        Ok(amounts.into_iter().map(|(_, amount)| amount).sum())
    }

    fn create_category(&mut self, name: &str) -> Result<i64> {
        self.insert_category(&Category::new(name.to_string()))
    }

    fn rename_category(&mut self, id: i64, name: &str) -> Result<()> {
        let updated = self
            .conn
            .execute(
                "UPDATE categories SET name = ?1 WHERE id = ?2",
                params![name, id],
            )
            .with_context(|| format!("Failed to rename category to '{name}'"))?;
        if updated == 0 {
            anyhow::bail!("Category {id} does not exist");
        }
        Ok(())
    }

    fn delete_category(&mut self, id: i64) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM expenses WHERE category_id = ?1", params![id])?;
        tx.execute("DELETE FROM categories WHERE id = ?1", params![id])?;

        let mut stale = Vec::new();
        {
            let mut stmt = tx.prepare("SELECT id, category_budgets FROM budgets")?;
            let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;
            for row in rows {
                let (budget_id, json) = row?;
                let mut mapping = CategoryBudgets::from_json(&json)
                    .with_context(|| format!("Budget {budget_id} has a corrupt category mapping"))?;
                if mapping.remove(id).is_some() {
                    stale.push((budget_id, mapping.to_json()?));
                }
            }
        }
        for (budget_id, json) in &stale {
            tx.execute(
                "UPDATE budgets SET category_budgets = ?1 WHERE id = ?2",
                params![json, budget_id],
            )?;
        }

        tx.commit()?;
        info!(id, expenses = removed, budgets = stale.len(), "deleted category");
        Ok(removed)
    }
}

type BudgetRow = (i64, u32, i32, String, String);

fn budget_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BudgetRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

/// Rows whose month/year fall outside the supported range are skipped.
fn budget_from_row((id, month, year, overall, mapping): BudgetRow) -> Result<Option<BudgetRecord>> {
    let Some(key) = MonthKey::new(month, year) else {
        warn!(id, month, year, "skipping budget with unsupported month");
        return Ok(None);
    };
    let category_budgets = CategoryBudgets::from_json(&mapping)
        .with_context(|| format!("Budget for {key} has a corrupt category mapping"))?;
    Ok(Some(BudgetRecord {
        id: Some(id),
        key,
        overall_budget: Decimal::from_str(&overall).unwrap_or_default(),
        category_budgets,
    }))
}

fn expense_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Expense> {
    let amt_str: String = row.get(2)?;
    let date_str: String = row.get(3)?;
    Ok(Expense {
        id: Some(row.get(0)?),
        category_id: row.get(1)?,
        amount: Decimal::from_str(&amt_str).unwrap_or_default(),
        date: Expense::parse_date(&date_str).unwrap_or_default(),
        note: row.get(4)?,
    })
}

fn insert_expense_row(tx: &Transaction<'_>, expense: &Expense) -> Result<i64> {
    tx.execute(
        "INSERT INTO expenses (id, category_id, amount, date, note) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            expense.id,
            expense.category_id,
            format_amount(expense.amount),
            expense.date_string(),
            expense.note,
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

#[cfg(test)]
mod tests;
