use chrono::NaiveDateTime;
use rust_decimal::Decimal;

pub(crate) const EXPENSE_NOTE_MAX_LENGTH: usize = 150;

/// Storage and export format for expense timestamps.
pub(crate) const EXPENSE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Expense {
    pub(crate) id: Option<i64>,
    pub(crate) category_id: i64,
    pub(crate) amount: Decimal,
    pub(crate) date: NaiveDateTime,
    pub(crate) note: Option<String>,
}

impl Expense {
    pub(crate) fn new(category_id: i64, amount: Decimal, date: NaiveDateTime, note: Option<String>) -> Self {
        Self {
            id: None,
            category_id,
            amount,
            date,
            note: note
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        }
    }

    pub(crate) fn date_string(&self) -> String {
        self.date.format(EXPENSE_DATE_FORMAT).to_string()
    }

    pub(crate) fn parse_date(s: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(s.trim(), EXPENSE_DATE_FORMAT).ok()
    }
}
