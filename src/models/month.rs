use chrono::{Datelike, Local, NaiveDate};

pub(crate) const MIN_YEAR: i32 = 2020;
pub(crate) const MAX_YEAR: i32 = 2080;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Identity of one budget record: a calendar month within the supported years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct MonthKey {
    month: u32,
    year: i32,
}

impl MonthKey {
    pub(crate) fn new(month: u32, year: i32) -> Option<Self> {
        if (1..=12).contains(&month) && (MIN_YEAR..=MAX_YEAR).contains(&year) {
            Some(Self { month, year })
        } else {
            None
        }
    }

    pub(crate) fn current() -> Self {
        let today = Local::now().date_naive();
        Self::from_date(today).unwrap_or(Self {
            month: today.month(),
            year: today.year().clamp(MIN_YEAR, MAX_YEAR),
        })
    }

    pub(crate) fn from_date(date: NaiveDate) -> Option<Self> {
        Self::new(date.month(), date.year())
    }

    /// Accepts `YYYY-MM`, `YYYY-M`, or a bare `M`/`MM` (resolved against
    /// `default_year`).
    pub(crate) fn parse(input: &str, default_year: i32) -> Option<Self> {
        let input = input.trim();
        if input.len() <= 2 {
            let month: u32 = input.parse().ok()?;
            return Self::new(month, default_year);
        }
        let (year, month) = input.split_once('-')?;
        Self::new(month.parse().ok()?, year.parse().ok()?)
    }

    pub(crate) fn month(&self) -> u32 {
        self.month
    }

    pub(crate) fn year(&self) -> i32 {
        self.year
    }

    /// `YYYY-MM`, the prefix every stored expense date in this month starts with.
    pub(crate) fn date_prefix(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    pub(crate) fn next(&self) -> Option<Self> {
        if self.month == 12 {
            Self::new(1, self.year + 1)
        } else {
            Self::new(self.month + 1, self.year)
        }
    }

    pub(crate) fn prev(&self) -> Option<Self> {
        if self.month == 1 {
            Self::new(12, self.year - 1)
        } else {
            Self::new(self.month - 1, self.year)
        }
    }

    pub(crate) fn month_name(&self) -> &'static str {
        MONTH_NAMES
            .get(self.month as usize - 1)
            .copied()
            .unwrap_or("Unknown")
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.month_name(), self.year)
    }
}
