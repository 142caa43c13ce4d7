use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;

use super::amount::format_amount;
use super::MonthKey;

/// Category id → budgeted amount for one month. A missing key means nothing is
/// budgeted for that category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CategoryBudgets(BTreeMap<i64, Decimal>);

impl CategoryBudgets {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, category_id: i64) -> Decimal {
        self.0.get(&category_id).copied().unwrap_or(Decimal::ZERO)
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, category_id: i64) -> bool {
        self.0.contains_key(&category_id)
    }

    /// The stored entry, distinguishing "absent" from an explicit zero.
    pub(crate) fn lookup(&self, category_id: i64) -> Option<Decimal> {
        self.0.get(&category_id).copied()
    }

    pub(crate) fn set(&mut self, category_id: i64, amount: Decimal) {
        self.0.insert(category_id, amount);
    }

    pub(crate) fn remove(&mut self, category_id: i64) -> Option<Decimal> {
        self.0.remove(&category_id)
    }

    pub(crate) fn total(&self) -> Decimal {
        self.0.values().copied().sum()
    }

    /// Sum of every entry except `category_id`.
    pub(crate) fn total_excluding(&self, category_id: i64) -> Decimal {
        self.0
            .iter()
            .filter(|(id, _)| **id != category_id)
            .map(|(_, amount)| *amount)
            .sum()
    }

    /// Drop entries whose category no longer exists.
    pub(crate) fn retain_categories(&mut self, live_ids: &[i64]) {
        self.0.retain(|id, _| live_ids.contains(id));
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (i64, Decimal)> + '_ {
        self.0.iter().map(|(id, amount)| (*id, *amount))
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Stored form: a JSON object keyed by stringified category id with
    /// two-decimal string amounts, e.g. `{"1":"80.00","4":"12.50"}`.
    pub(crate) fn to_json(&self) -> Result<String> {
        let stored: BTreeMap<i64, String> = self
            .0
            .iter()
            .map(|(id, amount)| (*id, format_amount(*amount)))
            .collect();
        serde_json::to_string(&stored).context("Failed to encode category budgets")
    }

    pub(crate) fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::new());
        }
        let stored: BTreeMap<i64, String> =
            serde_json::from_str(json).context("Malformed category budget mapping")?;
        let mut map = BTreeMap::new();
        for (id, amount) in stored {
            let amount = Decimal::from_str(&amount)
                .with_context(|| format!("Invalid budget amount for category {id}: {amount}"))?;
            map.insert(id, amount);
        }
        Ok(Self(map))
    }
}

impl FromIterator<(i64, Decimal)> for CategoryBudgets {
    fn from_iter<T: IntoIterator<Item = (i64, Decimal)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The one budget record kept per month/year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BudgetRecord {
    pub(crate) id: Option<i64>,
    pub(crate) key: MonthKey,
    pub(crate) overall_budget: Decimal,
    pub(crate) category_budgets: CategoryBudgets,
}

impl BudgetRecord {
    pub(crate) fn new(key: MonthKey, overall_budget: Decimal, category_budgets: CategoryBudgets) -> Self {
        Self {
            id: None,
            key,
            overall_budget,
            category_budgets,
        }
    }

    #[cfg(test)]
    pub(crate) fn categorized_total(&self) -> Decimal {
        self.category_budgets.total()
    }
}
