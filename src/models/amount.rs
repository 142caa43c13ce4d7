use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

pub(crate) const AMOUNT_INTEGER_DIGITS: usize = 8;
pub(crate) const AMOUNT_FRACTION_DIGITS: usize = 2;

/// Keystroke-level amount filter: up to 8 integer digits, optionally a point
/// and up to 2 fraction digits. The empty string is accepted (a cleared field).
static AMOUNT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^[0-9]{{0,{AMOUNT_INTEGER_DIGITS}}}(\.[0-9]{{0,{AMOUNT_FRACTION_DIGITS}}})?$"
    ))
    .ok()
});

/// Whether `input` is an acceptable (possibly partial) amount entry.
pub(crate) fn is_valid_amount_input(input: &str) -> bool {
    AMOUNT_PATTERN
        .as_ref()
        .is_some_and(|re| re.is_match(input))
}

/// Parse an amount entry. Returns `None` for anything that is not a complete,
/// well-formed amount ("" and "." pass the filter but are not amounts).
pub(crate) fn parse_amount(input: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    if !is_valid_amount_input(trimmed) {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}

/// Whether a stored amount fits the amount format: not negative and at most
/// `AMOUNT_INTEGER_DIGITS` integer digits.
pub(crate) fn is_storable_amount(val: Decimal) -> bool {
    let limit = Decimal::from(10u64.pow(AMOUNT_INTEGER_DIGITS as u32));
    val >= Decimal::ZERO && val < limit
}

/// Canonical persisted form: exactly two fraction digits, `.` separator.
pub(crate) fn format_amount(val: Decimal) -> String {
    format!("{:.2}", val.round_dp(2))
}

/// Display form with thousand separators, e.g. `1234567.89` → `"1,234,567.89"`.
pub(crate) fn format_amount_display(val: Decimal) -> String {
    let formatted = format_amount(val.abs());
    let mut parts = formatted.split('.');
    let int_part = parts.next().unwrap_or("0");
    let dec_part = parts.next().unwrap_or("00");

    let with_commas: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");

    if val < Decimal::ZERO {
        format!("-{with_commas}.{dec_part}")
    } else {
        format!("{with_commas}.{dec_part}")
    }
}

/// Echo a stored amount back into an input field: `100.00` → `"100"`,
/// `12.50` → `"12.50"`.
pub(crate) fn format_for_input(val: Decimal) -> String {
    let formatted = format_amount(val);
    match formatted.strip_suffix(".00") {
        Some(whole) => whole.to_string(),
        None => formatted,
    }
}
