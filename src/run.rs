mod cli;

pub(crate) use cli::{as_cli, print_usage};

use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::engine::BudgetError;
use crate::models::{Expense, MonthKey};

/// Flags that consume the following argument.
const VALUE_FLAGS: &[&str] = &["--month", "--date", "--note", "--sort", "--filter"];

pub(crate) fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

pub(crate) fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// Arguments that are neither flags nor the values of value-taking flags.
pub(crate) fn positionals(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_next = true;
        } else if !arg.starts_with("--") {
            out.push(arg.as_str());
        }
    }
    out
}

/// `YYYY-MM` or a bare month number; defaults to the current month.
pub(crate) fn month_arg(input: Option<&str>) -> Result<MonthKey> {
    let current = MonthKey::current();
    match input {
        None => Ok(current),
        Some(s) => Ok(MonthKey::parse(s, current.year()).ok_or(BudgetError::InvalidMonth)?),
    }
}

/// `YYYY-MM-DD` (midnight) or a full `YYYY-MM-DD HH:MM:SS`; defaults to now.
pub(crate) fn date_arg(input: Option<&str>) -> Result<NaiveDateTime> {
    let Some(s) = input else {
        return Ok(Local::now().naive_local());
    };
    if let Some(dt) = Expense::parse_date(s) {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow::anyhow!("Invalid date: {s} (expected YYYY-MM-DD [HH:MM:SS])"))
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}
