#![allow(clippy::unwrap_used)]

use super::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn march() -> MonthKey {
    MonthKey::new(3, 2024).unwrap()
}

fn at(s: &str) -> chrono::NaiveDateTime {
    Expense::parse_date(s).unwrap()
}

fn add_expense(db: &mut Database, category_id: i64, amount: Decimal, date: &str) -> i64 {
    db.insert_expense(&Expense::new(category_id, amount, at(date), None))
        .unwrap()
}

// ── Schema ────────────────────────────────────────────────────

#[test]
fn test_fresh_database_is_empty() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.get_categories().unwrap().is_empty());
    assert!(db.get_all_expenses().unwrap().is_empty());
    assert!(db.get_all_budget_records().unwrap().is_empty());
}

#[test]
fn test_open_file_twice_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("budget.db");
    {
        let mut db = Database::open(&path).unwrap();
        db.create_category("Food").unwrap();
    }
    let db = Database::open(&path).unwrap();
    let cats = db.get_categories().unwrap();
    assert_eq!(cats.len(), 1);
    assert_eq!(cats[0].name, "Food");
}

// ── Categories ────────────────────────────────────────────────

#[test]
fn test_categories_sorted_case_insensitively() {
    let mut db = Database::open_in_memory().unwrap();
    for name in ["rent", "Coffee", "books"] {
        db.create_category(name).unwrap();
    }
    let names: Vec<String> = db
        .get_categories()
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["books", "Coffee", "rent"]);
}

#[test]
fn test_category_name_unique_ignoring_case() {
    let mut db = Database::open_in_memory().unwrap();
    db.create_category("Food").unwrap();
    assert!(db.create_category("FOOD").is_err());
}

#[test]
fn test_rename_category() {
    let mut db = Database::open_in_memory().unwrap();
    let id = db.create_category("Food").unwrap();
    db.rename_category(id, "Groceries").unwrap();
    assert_eq!(db.get_category_by_id(id).unwrap().unwrap().name, "Groceries");
    assert!(db.rename_category(999, "Nope").is_err());
}

#[test]
fn test_category_by_id_not_found() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.get_category_by_id(99999).unwrap().is_none());
}

#[test]
fn test_delete_category_cascades() {
    let mut db = Database::open_in_memory().unwrap();
    let food = db.create_category("Food").unwrap();
    let rent = db.create_category("Rent").unwrap();
    add_expense(&mut db, food, dec!(10), "2024-03-01 08:00:00");
    add_expense(&mut db, food, dec!(5), "2024-04-01 08:00:00");
    add_expense(&mut db, rent, dec!(900), "2024-03-01 08:00:00");

    let budgets: CategoryBudgets = [(food, dec!(50)), (rent, dec!(900))].into_iter().collect();
    db.save_budget_record(&BudgetRecord::new(march(), dec!(1000), budgets.clone()))
        .unwrap();
    db.save_budget_record(&BudgetRecord::new(
        MonthKey::new(4, 2024).unwrap(),
        dec!(1000),
        budgets,
    ))
    .unwrap();

    let removed = db.delete_category(food).unwrap();
    assert_eq!(removed, 2);
    assert!(db.get_category_by_id(food).unwrap().is_none());

    let remaining = db.get_all_expenses().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].category_id, rent);

    for record in db.get_all_budget_records().unwrap() {
        assert!(!record.category_budgets.contains(food));
        assert_eq!(record.category_budgets.get(rent), dec!(900));
    }
}

#[test]
fn test_category_stats() {
    let mut db = Database::open_in_memory().unwrap();
    let food = db.create_category("Food").unwrap();
    db.create_category("Rent").unwrap();
    add_expense(&mut db, food, dec!(10.10), "2024-03-01 08:00:00");
    add_expense(&mut db, food, dec!(0.20), "2023-01-01 08:00:00");

    let stats = db.get_category_stats().unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].category.name, "Food");
    assert_eq!(stats[0].expense_count, 2);
    assert_eq!(stats[0].total_spent, dec!(10.30));
    assert_eq!(stats[1].expense_count, 0);
    assert_eq!(stats[1].total_spent, Decimal::ZERO);
}

// ── Expenses ──────────────────────────────────────────────────

#[test]
fn test_insert_expense_bumps_usage() {
    let mut db = Database::open_in_memory().unwrap();
    let food = db.create_category("Food").unwrap();
    add_expense(&mut db, food, dec!(3), "2024-03-01 08:00:00");
    add_expense(&mut db, food, dec!(4), "2024-03-02 08:00:00");
    assert_eq!(db.get_category_by_id(food).unwrap().unwrap().usage_count, 2);
}

#[test]
fn test_insert_expense_unknown_category_fails_cleanly() {
    let mut db = Database::open_in_memory().unwrap();
    let expense = Expense::new(42, dec!(3), at("2024-03-01 08:00:00"), None);
    assert!(db.insert_expense(&expense).is_err());
    assert!(db.get_all_expenses().unwrap().is_empty());
}

#[test]
fn test_expenses_for_month_newest_first() {
    let mut db = Database::open_in_memory().unwrap();
    let food = db.create_category("Food").unwrap();
    add_expense(&mut db, food, dec!(1), "2024-03-05 08:00:00");
    add_expense(&mut db, food, dec!(2), "2024-03-20 08:00:00");
    add_expense(&mut db, food, dec!(3), "2024-04-01 00:00:00");
    add_expense(&mut db, food, dec!(4), "2024-02-29 23:59:59");

    let march_expenses = db.get_expenses_for_month(march()).unwrap();
    let amounts: Vec<Decimal> = march_expenses.iter().map(|e| e.amount).collect();
    assert_eq!(amounts, vec![dec!(2), dec!(1)]);
    assert_eq!(db.get_month_total(march()).unwrap(), dec!(3));
}

#[test]
fn test_expense_roundtrip_fields() {
    let mut db = Database::open_in_memory().unwrap();
    let food = db.create_category("Food").unwrap();
    let expense = Expense::new(food, dec!(12.5), at("2024-03-05 18:30:00"), Some("lunch".into()));
    let id = db.insert_expense(&expense).unwrap();

    let fetched = &db.get_all_expenses().unwrap()[0];
    assert_eq!(fetched.id, Some(id));
    assert_eq!(fetched.amount, dec!(12.50));
    assert_eq!(fetched.date_string(), "2024-03-05 18:30:00");
    assert_eq!(fetched.note.as_deref(), Some("lunch"));
}

#[test]
fn test_delete_expense() {
    let mut db = Database::open_in_memory().unwrap();
    let food = db.create_category("Food").unwrap();
    let id = add_expense(&mut db, food, dec!(1), "2024-03-05 08:00:00");
    assert!(db.delete_expense(id).unwrap());
    assert!(!db.delete_expense(id).unwrap());
    assert!(db.get_all_expenses().unwrap().is_empty());
}

#[test]
fn test_sum_expenses_for_month_is_exact() {
    let mut db = Database::open_in_memory().unwrap();
    let food = db.create_category("Food").unwrap();
    let rent = db.create_category("Rent").unwrap();
    for _ in 0..10 {
        add_expense(&mut db, food, dec!(0.10), "2024-03-05 08:00:00");
    }
    add_expense(&mut db, rent, dec!(500), "2024-03-05 08:00:00");
    assert_eq!(db.sum_expenses_for_month(food, march()).unwrap(), dec!(1.00));
    assert_eq!(
        db.sum_expenses_for_month(food, MonthKey::new(4, 2024).unwrap())
            .unwrap(),
        Decimal::ZERO
    );
}

// ── Budgets ───────────────────────────────────────────────────

#[test]
fn test_budget_record_missing() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.get_budget_record(march()).unwrap().is_none());
}

#[test]
fn test_budget_upsert_by_month() {
    let mut db = Database::open_in_memory().unwrap();
    let food = db.create_category("Food").unwrap();

    let first = BudgetRecord::new(march(), dec!(100), CategoryBudgets::new());
    let id1 = db.save_budget_record(&first).unwrap();

    let mapping: CategoryBudgets = [(food, dec!(40.5))].into_iter().collect();
    let second = BudgetRecord::new(march(), dec!(250), mapping);
    let id2 = db.save_budget_record(&second).unwrap();
    assert_eq!(id1, id2);

    let stored = db.get_budget_record(march()).unwrap().unwrap();
    assert_eq!(stored.id, Some(id1));
    assert_eq!(stored.overall_budget, dec!(250));
    assert_eq!(stored.category_budgets.get(food), dec!(40.50));
    assert_eq!(db.get_all_budget_records().unwrap().len(), 1);
}

#[test]
fn test_budgets_are_per_month() {
    let mut db = Database::open_in_memory().unwrap();
    db.save_budget_record(&BudgetRecord::new(march(), dec!(100), CategoryBudgets::new()))
        .unwrap();
    db.save_budget_record(&BudgetRecord::new(
        MonthKey::new(3, 2025).unwrap(),
        dec!(200),
        CategoryBudgets::new(),
    ))
    .unwrap();

    let all = db.get_all_budget_records().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].key, march());
    assert_eq!(all[1].overall_budget, dec!(200));
}

// ── Import ────────────────────────────────────────────────────

#[test]
fn test_replace_all_keeps_ids() {
    let mut db = Database::open_in_memory().unwrap();
    let old = db.create_category("Old").unwrap();
    add_expense(&mut db, old, dec!(1), "2024-03-05 08:00:00");

    let categories = vec![Category {
        id: Some(7),
        name: "Travel".into(),
        usage_count: 3,
    }];
    let mut expense = Expense::new(7, dec!(99.99), at("2024-03-05 08:00:00"), None);
    expense.id = Some(11);
    let mut record = BudgetRecord::new(march(), dec!(500), [(7, dec!(100))].into_iter().collect());
    record.id = Some(2);

    db.replace_all(&categories, &[expense], &[record]).unwrap();

    let cats = db.get_categories().unwrap();
    assert_eq!(cats.len(), 1);
    assert_eq!(cats[0].id, Some(7));
    assert_eq!(cats[0].usage_count, 3);
    assert_eq!(db.get_all_expenses().unwrap()[0].id, Some(11));
    let stored = db.get_budget_record(march()).unwrap().unwrap();
    assert_eq!(stored.id, Some(2));
    assert_eq!(stored.category_budgets.get(7), dec!(100));
}

#[test]
fn test_replace_all_failure_keeps_previous_data() {
    let mut db = Database::open_in_memory().unwrap();
    db.create_category("Keep").unwrap();

    // second category collides on name
    let categories = vec![
        Category {
            id: Some(1),
            name: "Dup".into(),
            usage_count: 0,
        },
        Category {
            id: Some(2),
            name: "dup".into(),
            usage_count: 0,
        },
    ];
    assert!(db.replace_all(&categories, &[], &[]).is_err());

    let cats = db.get_categories().unwrap();
    assert_eq!(cats.len(), 1);
    assert_eq!(cats[0].name, "Keep");
}
