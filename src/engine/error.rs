use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{CATEGORY_NAME_MAX_LENGTH, EXPENSE_NOTE_MAX_LENGTH, MAX_YEAR, MIN_YEAR};

/// Rejections the budget engine reports back to its caller. None of these end
/// the session; persisted state is untouched whenever one is returned.
#[derive(Error, Debug)]
pub(crate) enum BudgetError {
    #[error("Please set a valid total budget amount!")]
    InvalidAmount,

    #[error("Category budgets exceed total budget by {excess:.2}!")]
    OverAllocated { excess: Decimal },

    #[error("Please set a total budget first!")]
    NoOverallBudget,

    #[error("{0}")]
    InvalidName(NameProblem),

    #[error("Category '{0}' already exists!")]
    DuplicateName(String),

    #[error("Category not found (id {0})")]
    UnknownCategory(i64),

    #[error("Month must be 1-12 and year {}-{}", MIN_YEAR, MAX_YEAR)]
    InvalidMonth,

    #[error("Note must be {} characters or less!", EXPENSE_NOTE_MAX_LENGTH)]
    InvalidNote,

    /// The category was created but its initial budget could not be saved.
    #[error("Category '{category}' was added, but its budget could not be saved: {source}")]
    BudgetAssignment {
        category: String,
        #[source]
        source: Box<BudgetError>,
    },

    #[error("Storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NameProblem {
    Blank,
    TooLong,
}

impl std::fmt::Display for NameProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank => write!(f, "Category name cannot be empty!"),
            Self::TooLong => write!(
                f,
                "Category name must be {CATEGORY_NAME_MAX_LENGTH} characters or less!"
            ),
        }
    }
}

impl BudgetError {
    /// Validation rejections, as opposed to storage failures.
    pub(crate) fn is_validation(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::BudgetAssignment { .. })
    }
}

pub(crate) type BudgetResult<T> = std::result::Result<T, BudgetError>;
