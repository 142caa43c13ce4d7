//! Budget reconciliation: keeps a month's overall budget, its per-category
//! allocations and actual category spend consistent.
//!
//! The engine holds a working copy of one month (categories, the last
//! persisted record, the typed overall amount, the possibly-uncommitted
//! category mapping, and per-category spend). Every `commit_*` is a single
//! validate-then-persist step; a rejected commit never touches storage.

mod error;
mod ledger;
mod notice;
mod store;
mod summary;

pub(crate) use error::{BudgetError, BudgetResult, NameProblem};
pub(crate) use ledger::new_expense;
pub(crate) use notice::Notice;
pub(crate) use store::BudgetStore;
pub(crate) use summary::{MonthSummary, SummaryRow};

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::models::amount::{format_amount, format_for_input, is_valid_amount_input, parse_amount};
use crate::models::{
    sort_categories, BudgetRecord, Category, CategoryBudgets, CategoryOrder, MonthKey,
    CATEGORY_NAME_MAX_LENGTH,
};

pub(crate) struct BudgetEngine<S: BudgetStore> {
    store: S,
    key: MonthKey,
    categories: Vec<Category>,
    /// Last persisted record for `key`, if one exists.
    record: Option<BudgetRecord>,
    overall_input: String,
    category_budgets: CategoryBudgets,
    spent: BTreeMap<i64, Decimal>,
}

impl<S: BudgetStore> BudgetEngine<S> {
    /// Open the engine on `key`. A month with no budget record yet is a valid,
    /// empty state.
    pub(crate) fn load(store: S, key: MonthKey) -> BudgetResult<Self> {
        let mut engine = Self {
            store,
            key,
            categories: Vec::new(),
            record: None,
            overall_input: String::new(),
            category_budgets: CategoryBudgets::new(),
            spent: BTreeMap::new(),
        };
        engine.load_month(key)?;
        Ok(engine)
    }

    /// Replace the working state wholesale with `key`'s persisted state.
    pub(crate) fn load_month(&mut self, key: MonthKey) -> BudgetResult<()> {
        let categories = self.store.list_categories()?;
        let record = self.store.get_budget_record(key)?;

        let live_ids: Vec<i64> = categories.iter().filter_map(|c| c.id).collect();
        let mut category_budgets = record
            .as_ref()
            .map(|r| r.category_budgets.clone())
            .unwrap_or_default();
        let stored_entries = category_budgets.len();
        category_budgets.retain_categories(&live_ids);
        if category_budgets.len() != stored_entries {
            warn!(
                month = %key,
                dropped = stored_entries - category_budgets.len(),
                "ignoring budget entries for deleted categories"
            );
        }

        let mut spent = BTreeMap::new();
        for id in &live_ids {
            spent.insert(*id, self.store.sum_expenses_for_month(*id, key)?);
        }

        self.overall_input = record
            .as_ref()
            .map(|r| format_for_input(r.overall_budget))
            .unwrap_or_default();
        self.key = key;
        self.categories = categories;
        self.record = record;
        self.category_budgets = category_budgets;
        self.spent = spent;

        debug!(
            month = %key,
            categories = self.categories.len(),
            has_record = self.record.is_some(),
            "loaded budget month"
        );
        Ok(())
    }

    // ── Overall budget ────────────────────────────────────────

    /// Keystroke-level update of the typed overall amount. Malformed input is
    /// ignored and the field keeps its previous text.
    pub(crate) fn set_overall_budget(&mut self, input: &str) -> bool {
        if !is_valid_amount_input(input) {
            return false;
        }
        self.overall_input = input.to_string();
        true
    }

    pub(crate) fn commit_overall_budget(&mut self) -> BudgetResult<Notice> {
        let total = self.overall_amount();
        if total <= Decimal::ZERO {
            debug!(month = %self.key, input = %self.overall_input, "rejected overall budget");
            return Err(BudgetError::InvalidAmount);
        }

        let categorized = self.category_budgets.total();
        if categorized > total {
            let excess = categorized - total;
            debug!(month = %self.key, %excess, "overall budget below categorized total");
            return Err(BudgetError::OverAllocated { excess });
        }

        self.persist(total, self.category_budgets.clone())?;
        info!(month = %self.key, overall = %total, "saved overall budget");
        Ok(Notice::success("Budget saved successfully!"))
    }

    // ── Category budgets ──────────────────────────────────────

    /// Optimistically write a category's typed amount into the working
    /// mapping. Nothing is persisted until `commit_category_budget`.
    pub(crate) fn set_category_budget(&mut self, category_id: i64, input: &str) -> bool {
        if !is_valid_amount_input(input) || self.category(category_id).is_none() {
            return false;
        }
        let amount = parse_amount(input).unwrap_or(Decimal::ZERO);
        self.category_budgets.set(category_id, amount);
        true
    }

    pub(crate) fn commit_category_budget(&mut self, category_id: i64) -> BudgetResult<Notice> {
        let name = self
            .category(category_id)
            .map(|c| c.name.clone())
            .ok_or(BudgetError::UnknownCategory(category_id))?;

        let overall = self.committed_overall();
        if overall <= Decimal::ZERO {
            self.rollback_category(category_id);
            return Err(BudgetError::NoOverallBudget);
        }

        let pending = self.category_budgets.get(category_id);
        let new_total = self.category_budgets.total_excluding(category_id) + pending;
        if new_total > overall {
            let excess = new_total - overall;
            self.rollback_category(category_id);
            return Err(BudgetError::OverAllocated { excess });
        }

        if let Err(err) = self.persist(overall, self.category_budgets.clone()) {
            self.rollback_category(category_id);
            return Err(err);
        }

        info!(month = %self.key, category = %name, amount = %pending, "saved category budget");
        Ok(Notice::success(format!(
            "{name} budget ({}) saved successfully!",
            format_amount(pending)
        )))
    }

    /// Restore a category's working value from storage after a rejected
    /// commit, so an unsaved number is never shown as current.
    fn rollback_category(&mut self, category_id: i64) {
        let persisted = match self.store.get_budget_record(self.key) {
            Ok(record) => record.and_then(|r| r.category_budgets.lookup(category_id)),
            Err(err) => {
                warn!(
                    month = %self.key,
                    category_id,
                    "could not re-read budget for rollback, using cached record: {err:#}"
                );
                self.record
                    .as_ref()
                    .and_then(|r| r.category_budgets.lookup(category_id))
            }
        };

        match persisted {
            Some(amount) => self.category_budgets.set(category_id, amount),
            None => {
                self.category_budgets.remove(category_id);
            }
        }
        debug!(month = %self.key, category_id, restored = ?persisted, "rolled back category budget");
    }

    // ── Categories ────────────────────────────────────────────

    /// Create a category, optionally with an initial budget for the current
    /// month. Every check runs before anything is written, so a rejection
    /// creates nothing. If the category is created but the budget write then
    /// fails, the category stays and `BudgetAssignment` is returned.
    pub(crate) fn add_category(&mut self, name: &str, initial_budget: Decimal) -> BudgetResult<Notice> {
        let name = self.validate_name(name, None)?;

        if initial_budget < Decimal::ZERO {
            return Err(BudgetError::InvalidAmount);
        }

        let overall = self.committed_overall();
        if initial_budget > Decimal::ZERO {
            if overall <= Decimal::ZERO {
                return Err(BudgetError::NoOverallBudget);
            }
            let remaining = overall - self.category_budgets.total();
            if initial_budget > remaining {
                return Err(BudgetError::OverAllocated {
                    excess: initial_budget - remaining,
                });
            }
        }

        let id = self.store.create_category(&name)?;
        self.categories.push(Category {
            id: Some(id),
            name: name.clone(),
            usage_count: 0,
        });
        sort_categories(&mut self.categories, CategoryOrder::Name);
        self.spent.insert(id, Decimal::ZERO);
        info!(category = %name, id, "created category");

        if initial_budget <= Decimal::ZERO {
            return Ok(Notice::success(format!("Category '{name}' added successfully!")));
        }

        let mut mapping = self.category_budgets.clone();
        mapping.set(id, initial_budget);
        if let Err(err) = self.persist(overall, mapping.clone()) {
            warn!(category = %name, "category created without its initial budget");
            return Err(BudgetError::BudgetAssignment {
                category: name,
                source: Box::new(err),
            });
        }
        self.category_budgets = mapping;

        Ok(Notice::success(format!(
            "Category '{name}' added with budget {}!",
            format_amount(initial_budget)
        )))
    }

    pub(crate) fn rename_category(&mut self, category_id: i64, new_name: &str) -> BudgetResult<Notice> {
        if self.category(category_id).is_none() {
            return Err(BudgetError::UnknownCategory(category_id));
        }
        let name = self.validate_name(new_name, Some(category_id))?;

        self.store.rename_category(category_id, &name)?;
        if let Some(cat) = self.categories.iter_mut().find(|c| c.id == Some(category_id)) {
            cat.name = name.clone();
        }
        sort_categories(&mut self.categories, CategoryOrder::Name);

        info!(category_id, name = %name, "renamed category");
        Ok(Notice::success(format!("Category renamed to '{name}' successfully!")))
    }

    /// Delete a category, its expenses and its budget entries. The store does
    /// this as one unit; working state follows only once it has succeeded.
    pub(crate) fn delete_category(&mut self, category_id: i64) -> BudgetResult<Notice> {
        let name = self
            .category(category_id)
            .map(|c| c.name.clone())
            .ok_or(BudgetError::UnknownCategory(category_id))?;

        let removed = self.store.delete_category(category_id)?;

        self.categories.retain(|c| c.id != Some(category_id));
        self.category_budgets.remove(category_id);
        self.spent.remove(&category_id);
        if let Some(record) = self.record.as_mut() {
            record.category_budgets.remove(category_id);
        }

        info!(category = %name, expenses = removed, "deleted category");
        let message = if removed > 0 {
            format!("Category '{name}' and {removed} expenses deleted successfully!")
        } else {
            format!("Category '{name}' deleted successfully!")
        };
        Ok(Notice::success(message))
    }

    fn validate_name(&self, name: &str, exclude: Option<i64>) -> BudgetResult<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(BudgetError::InvalidName(NameProblem::Blank));
        }
        if trimmed.chars().count() > CATEGORY_NAME_MAX_LENGTH {
            return Err(BudgetError::InvalidName(NameProblem::TooLong));
        }

        let lower = trimmed.to_lowercase();
        let duplicate = self
            .categories
            .iter()
            .filter(|c| exclude.is_none() || c.id != exclude)
            .any(|c| c.name.to_lowercase() == lower);
        if duplicate {
            return Err(BudgetError::DuplicateName(trimmed.to_string()));
        }

        Ok(trimmed.to_string())
    }

    fn persist(&mut self, overall: Decimal, category_budgets: CategoryBudgets) -> BudgetResult<()> {
        let mut record = BudgetRecord {
            id: self.record.as_ref().and_then(|r| r.id),
            key: self.key,
            overall_budget: overall,
            category_budgets,
        };
        let id = self.store.save_budget_record(&record)?;
        record.id = Some(id);
        self.record = Some(record);
        Ok(())
    }

    // ── Derived values ────────────────────────────────────────

    #[cfg(test)]
    pub(crate) fn key(&self) -> MonthKey {
        self.key
    }

    #[cfg(test)]
    pub(crate) fn overall_input(&self) -> &str {
        &self.overall_input
    }

    /// The typed overall amount, zero when blank or incomplete.
    pub(crate) fn overall_amount(&self) -> Decimal {
        parse_amount(&self.overall_input).unwrap_or(Decimal::ZERO)
    }

    /// The last persisted overall amount, zero when no record exists.
    pub(crate) fn committed_overall(&self) -> Decimal {
        self.record
            .as_ref()
            .map_or(Decimal::ZERO, |r| r.overall_budget)
    }

    pub(crate) fn has_overall_budget(&self) -> bool {
        !self.overall_input.trim().is_empty() && self.overall_amount() > Decimal::ZERO
    }

    pub(crate) fn categorized_total(&self) -> Decimal {
        self.category_budgets.total()
    }

    /// Unallocated part of the overall budget, never negative.
    pub(crate) fn remaining(&self) -> Decimal {
        (self.overall_amount() - self.categorized_total()).max(Decimal::ZERO)
    }

    /// How far the category allocations exceed the overall budget, or zero.
    pub(crate) fn over_budget(&self) -> Decimal {
        (self.categorized_total() - self.overall_amount()).max(Decimal::ZERO)
    }

    pub(crate) fn category_budget(&self, category_id: i64) -> Decimal {
        self.category_budgets.get(category_id)
    }

    pub(crate) fn category(&self, category_id: i64) -> Option<&Category> {
        Category::find_by_id(&self.categories, category_id)
    }

    #[cfg(test)]
    pub(crate) fn find_category(&self, name: &str) -> Option<&Category> {
        Category::find_by_name(&self.categories, name)
    }

    pub(crate) fn categories(&self, order: CategoryOrder) -> Vec<Category> {
        let mut categories = self.categories.clone();
        sort_categories(&mut categories, order);
        categories
    }

    pub(crate) fn spent(&self, category_id: i64) -> Decimal {
        self.spent.get(&category_id).copied().unwrap_or(Decimal::ZERO)
    }

    pub(crate) fn summary_row(&self, category_id: i64) -> Option<SummaryRow> {
        let category = self.category(category_id)?;
        Some(SummaryRow::new(
            category_id,
            category.name.clone(),
            self.category_budget(category_id),
            self.spent(category_id),
        ))
    }

    pub(crate) fn summary(&self) -> MonthSummary {
        let rows: Vec<SummaryRow> = self
            .categories(CategoryOrder::Name)
            .iter()
            .filter_map(|c| c.id)
            .filter_map(|id| self.summary_row(id))
            .collect();
        let total_spent = rows.iter().map(|r| r.spent).sum();

        MonthSummary {
            key: self.key,
            overall: self.overall_amount(),
            categorized: self.categorized_total(),
            remaining: self.remaining(),
            over_budget: self.over_budget(),
            total_spent,
            rows,
        }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub(crate) fn into_store(self) -> S {
        self.store
    }
}
