#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::amount::*;
use super::*;

// ── Amount input filter ───────────────────────────────────────

#[test]
fn test_amount_input_accepts_partial_entries() {
    for input in ["", "0", "12", "12.", "12.5", "12.50", ".5", "12345678", "12345678.99"] {
        assert!(is_valid_amount_input(input), "should accept {input:?}");
    }
}

#[test]
fn test_amount_input_rejects_malformed() {
    for input in [
        "123456789",
        "1.234",
        "-5",
        "1,000",
        "abc",
        "1.2.3",
        " 12",
        "1e5",
    ] {
        assert!(!is_valid_amount_input(input), "should reject {input:?}");
    }
}

#[test]
fn test_parse_amount() {
    assert_eq!(parse_amount("100"), Some(dec!(100)));
    assert_eq!(parse_amount("12.5"), Some(dec!(12.5)));
    assert_eq!(parse_amount("0.01"), Some(dec!(0.01)));
    assert_eq!(parse_amount(""), None);
    assert_eq!(parse_amount("."), None);
    assert_eq!(parse_amount("1.999"), None);
}

#[test]
fn test_storable_amount_range() {
    assert!(is_storable_amount(Decimal::ZERO));
    assert!(is_storable_amount(dec!(99999999.99)));
    assert!(!is_storable_amount(dec!(100000000)));
    assert!(!is_storable_amount(dec!(-0.01)));
}

// ── Amount formatting ─────────────────────────────────────────

#[test]
fn test_format_amount_two_decimals() {
    assert_eq!(format_amount(dec!(5)), "5.00");
    assert_eq!(format_amount(dec!(1.5)), "1.50");
    assert_eq!(format_amount(dec!(1234567.89)), "1234567.89");
    assert_eq!(format_amount(Decimal::ZERO), "0.00");
}

#[test]
fn test_format_amount_display() {
    assert_eq!(format_amount_display(dec!(1234.56)), "1,234.56");
    assert_eq!(format_amount_display(dec!(999.99)), "999.99");
    assert_eq!(format_amount_display(dec!(10000000)), "10,000,000.00");
    assert_eq!(format_amount_display(dec!(-42.5)), "-42.50");
}

#[test]
fn test_format_for_input_drops_whole_cents() {
    assert_eq!(format_for_input(dec!(100)), "100");
    assert_eq!(format_for_input(dec!(100.00)), "100");
    assert_eq!(format_for_input(dec!(12.5)), "12.50");
    assert!(is_valid_amount_input(&format_for_input(dec!(99999999.99))));
}

// ── MonthKey ──────────────────────────────────────────────────

#[test]
fn test_month_key_bounds() {
    assert!(MonthKey::new(1, MIN_YEAR).is_some());
    assert!(MonthKey::new(12, MAX_YEAR).is_some());
    assert!(MonthKey::new(0, 2024).is_none());
    assert!(MonthKey::new(13, 2024).is_none());
    assert!(MonthKey::new(6, MIN_YEAR - 1).is_none());
    assert!(MonthKey::new(6, MAX_YEAR + 1).is_none());
}

#[test]
fn test_month_key_parse() {
    assert_eq!(MonthKey::parse("2024-03", 2030), MonthKey::new(3, 2024));
    assert_eq!(MonthKey::parse("2024-3", 2030), MonthKey::new(3, 2024));
    assert_eq!(MonthKey::parse("7", 2030), MonthKey::new(7, 2030));
    assert_eq!(MonthKey::parse("2024-13", 2030), None);
    assert_eq!(MonthKey::parse("march", 2030), None);
}

#[test]
fn test_month_key_navigation() {
    let dec_2024 = MonthKey::new(12, 2024).unwrap();
    assert_eq!(dec_2024.next(), MonthKey::new(1, 2025));
    assert_eq!(MonthKey::new(1, 2025).unwrap().prev(), Some(dec_2024));
    assert_eq!(MonthKey::new(12, MAX_YEAR).unwrap().next(), None);
}

#[test]
fn test_month_key_display_and_prefix() {
    let key = MonthKey::new(3, 2024).unwrap();
    assert_eq!(key.date_prefix(), "2024-03");
    assert_eq!(key.to_string(), "March 2024");
}

// ── CategoryBudgets ───────────────────────────────────────────

#[test]
fn test_category_budgets_totals() {
    let mut budgets = CategoryBudgets::new();
    budgets.set(1, dec!(80));
    budgets.set(2, dec!(20.50));
    assert_eq!(budgets.total(), dec!(100.50));
    assert_eq!(budgets.total_excluding(1), dec!(20.50));
    assert_eq!(budgets.get(3), Decimal::ZERO);
    assert!(!budgets.contains(3));
}

#[test]
fn test_category_budgets_json_roundtrip() {
    let budgets: CategoryBudgets = [(1, dec!(80)), (12, dec!(0.5))].into_iter().collect();
    let json = budgets.to_json().unwrap();
    assert_eq!(json, r#"{"1":"80.00","12":"0.50"}"#);
    assert_eq!(CategoryBudgets::from_json(&json).unwrap(), budgets);
}

#[test]
fn test_category_budgets_from_empty_json() {
    assert!(CategoryBudgets::from_json("").unwrap().is_empty());
    assert!(CategoryBudgets::from_json("{}").unwrap().is_empty());
    assert!(CategoryBudgets::from_json("not json").is_err());
}

#[test]
fn test_category_budgets_retain_live() {
    let mut budgets: CategoryBudgets = [(1, dec!(10)), (2, dec!(20))].into_iter().collect();
    budgets.retain_categories(&[2, 3]);
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets.get(2), dec!(20));
}

// ── Category ──────────────────────────────────────────────────

fn cat(id: i64, name: &str, usage: i64) -> Category {
    Category {
        id: Some(id),
        name: name.into(),
        usage_count: usage,
    }
}

#[test]
fn test_category_find_by_name_case_insensitive() {
    let cats = vec![cat(1, "Food", 0), cat(2, "Travel", 0)];
    assert_eq!(Category::find_by_name(&cats, "food").unwrap().id, Some(1));
    assert_eq!(Category::find_by_name(&cats, " TRAVEL ").unwrap().id, Some(2));
    assert!(Category::find_by_name(&cats, "Rent").is_none());
}

#[test]
fn test_sort_categories_by_name() {
    let mut cats = vec![cat(1, "rent", 0), cat(2, "Food", 9), cat(3, "bills", 3)];
    sort_categories(&mut cats, CategoryOrder::Name);
    let names: Vec<&str> = cats.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["bills", "Food", "rent"]);
}

#[test]
fn test_sort_categories_most_used() {
    let mut cats = vec![cat(1, "Rent", 2), cat(2, "Food", 9), cat(3, "Bills", 2)];
    sort_categories(&mut cats, CategoryOrder::MostUsed);
    let names: Vec<&str> = cats.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Food", "Bills", "Rent"]);
}

#[test]
fn test_arrange_stats_filters_and_sorts() {
    let stats = vec![
        CategoryStats {
            category: cat(1, "Groceries", 0),
            expense_count: 4,
            total_spent: dec!(120),
        },
        CategoryStats {
            category: cat(2, "Gas", 0),
            expense_count: 1,
            total_spent: dec!(300),
        },
        CategoryStats {
            category: cat(3, "Rent", 0),
            expense_count: 1,
            total_spent: dec!(900),
        },
    ];

    let filtered = arrange_stats(stats.clone(), "g", StatsSort::TotalSpent, false);
    let names: Vec<&str> = filtered.iter().map(|s| s.category.name.as_str()).collect();
    assert_eq!(names, ["Gas", "Groceries"]);

    let by_usage = arrange_stats(stats, "", StatsSort::Usage, false);
    assert_eq!(by_usage[0].category.name, "Groceries");
}

// ── Expense ───────────────────────────────────────────────────

#[test]
fn test_expense_blank_note_is_none() {
    let date = Expense::parse_date("2024-03-05 10:30:00").unwrap();
    let expense = Expense::new(1, dec!(4.50), date, Some("   ".into()));
    assert!(expense.note.is_none());
    assert_eq!(expense.date_string(), "2024-03-05 10:30:00");
    assert!(expense.date_string().starts_with(&MonthKey::new(3, 2024).unwrap().date_prefix()));
}

#[test]
fn test_expense_parse_date_rejects_garbage() {
    assert!(Expense::parse_date("2024-03-05").is_none());
    assert!(Expense::parse_date("yesterday").is_none());
    assert_eq!(EXPENSE_DATE_FORMAT, "%Y-%m-%d %H:%M:%S");
}
