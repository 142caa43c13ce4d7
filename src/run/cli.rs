use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::Path;
use tracing::{debug, warn};

use super::{date_arg, flag_value, has_flag, month_arg, positionals, shellexpand};
use crate::db::Database;
use crate::engine::{new_expense, BudgetEngine, BudgetError, BudgetResult, Notice};
use crate::models::amount::{format_amount_display, parse_amount};
use crate::models::{arrange_stats, Category, CategoryOrder, MonthKey, StatsSort};
use crate::transfer;

pub(crate) fn as_cli(args: &[String], db: Database) -> Result<()> {
    let rest = &args[2..];
    match args[1].as_str() {
        "budget" | "b" => cli_budget(rest, db),
        "set-total" => cli_set_total(rest, db),
        "set-category" => cli_set_category(rest, db),
        "categories" | "c" => cli_categories(rest, &db),
        "add-category" => cli_add_category(rest, db),
        "rename-category" => cli_rename_category(rest, db),
        "delete-category" => cli_delete_category(rest, db),
        "add-expense" | "a" => cli_add_expense(rest, db),
        "expenses" | "e" => cli_expenses(rest, &db),
        "delete-expense" => cli_delete_expense(rest, &db),
        "summary" | "s" => cli_summary(rest, db),
        "export-json" => cli_export_json(rest, &db),
        "import-json" => cli_import_json(rest, db),
        "export-csv" => cli_export_csv(rest, &db),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("budgetbook {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

pub(crate) fn print_usage() {
    println!("BudgetBook: local-only expense tracker with monthly budgets");
    println!();
    println!("Usage: budgetbook [--db <path>] <command>");
    println!();
    println!("Commands:");
    println!("  budget [YYYY-MM]                     Show the month's budget allocation");
    println!("  set-total <amount>                   Set the month's total budget");
    println!("  set-category <name> <amount>         Set a category's budget for the month");
    println!("    --month <YYYY-MM>                  Month to change (default: current)");
    println!("  categories                           List categories");
    println!("    --usage                            Most used first");
    println!("    --stats                            Expense count and total spent");
    println!("    --sort <name|usage|amount>         Sort order for --stats");
    println!("    --desc                             Descending order for --stats");
    println!("    --filter <text>                    Name filter for --stats");
    println!("  add-category <name> [amount]         Add a category, optionally budgeted");
    println!("  rename-category <old> <new>          Rename a category");
    println!("  delete-category <name>               Delete a category and its expenses");
    println!("  add-expense <category> <amount>      Record an expense");
    println!("    --date <YYYY-MM-DD[ HH:MM:SS]>     When (default: now)");
    println!("    --note <text>                      Optional note");
    println!("  expenses [YYYY-MM]                   List the month's expenses");
    println!("  delete-expense <id>                  Delete an expense");
    println!("  summary [YYYY-MM]                    Budget vs. actual per category");
    println!("  export-json <path>                   Export all data to JSON");
    println!("  import-json <path>                   Replace all data from a JSON export");
    println!("  export-csv [path]                    Export a month's expenses to CSV");
    println!("  --help, -h                           Show this help");
    println!("  --version, -V                        Show version");
}

/// Print an engine outcome. Rejections go to stderr and fail the command.
fn report(result: BudgetResult<Notice>) -> Result<()> {
    let notice = match &result {
        Ok(notice) => notice.clone(),
        Err(err) => Notice::from(err),
    };
    debug!(error = notice.is_error, display_for = ?notice.display_for, "{notice}");
    match result {
        Ok(_) => {
            println!("{notice}");
            Ok(())
        }
        Err(err) => {
            if !err.is_validation() {
                warn!("{err}");
            }
            Err(anyhow::Error::new(err))
        }
    }
}

fn open_engine(db: Database, month: Option<&str>) -> Result<BudgetEngine<Database>> {
    let key = month_arg(month)?;
    Ok(BudgetEngine::load(db, key)?)
}

fn require_category<'a>(categories: &'a [Category], name: &str) -> Result<&'a Category> {
    Category::find_by_name(categories, name).ok_or_else(|| anyhow::anyhow!("Category '{name}' not found"))
}

fn category_id(category: &Category) -> Result<i64> {
    category
        .id
        .ok_or_else(|| anyhow::anyhow!("Category '{}' has no ID", category.name))
}

// ── Budgets ───────────────────────────────────────────────────

fn cli_budget(args: &[String], db: Database) -> Result<()> {
    let engine = open_engine(db, positionals(args).first().copied())?;
    let summary = engine.summary();

    println!("Budget: {}", summary.key);
    println!("{}", "─".repeat(40));
    if engine.has_overall_budget() {
        println!("  Total:       {}", format_amount_display(summary.overall));
    } else {
        println!("  Total:       (not set)");
    }
    println!("  Allocated:   {}", format_amount_display(summary.categorized));
    println!("  Remaining:   {}", format_amount_display(summary.remaining));
    if summary.over_budget > Decimal::ZERO {
        println!("  Over budget: {}", format_amount_display(summary.over_budget));
    }

    if !summary.rows.is_empty() {
        println!();
        println!("{:<24} {:>12}", "Category", "Budget");
        println!("{}", "─".repeat(37));
        for row in &summary.rows {
            println!("{:<24} {:>12}", row.name, format_amount_display(row.budgeted));
        }
    }

    let nav: Vec<String> = [("previous", summary.key.prev()), ("next", summary.key.next())]
        .into_iter()
        .filter_map(|(label, key)| key.map(|k| format!("{label}: budget {}", k.date_prefix())))
        .collect();
    println!();
    println!("  {}", nav.join("  |  "));
    Ok(())
}

fn cli_set_total(args: &[String], db: Database) -> Result<()> {
    let pos = positionals(args);
    let Some(amount) = pos.first() else {
        anyhow::bail!("Usage: budgetbook set-total <amount> [--month <YYYY-MM>]");
    };
    let mut engine = open_engine(db, flag_value(args, "--month"))?;
    if !engine.set_overall_budget(amount) {
        return report(Err(BudgetError::InvalidAmount));
    }
    report(engine.commit_overall_budget())
}

fn cli_set_category(args: &[String], db: Database) -> Result<()> {
    let pos = positionals(args);
    let (Some(name), Some(amount)) = (pos.first(), pos.get(1)) else {
        anyhow::bail!("Usage: budgetbook set-category <name> <amount> [--month <YYYY-MM>]");
    };
    let mut engine = open_engine(db, flag_value(args, "--month"))?;
    let id = category_id(require_category(&engine.categories(CategoryOrder::Name), name)?)?;
    if !engine.set_category_budget(id, amount) {
        return report(Err(BudgetError::InvalidAmount));
    }
    report(engine.commit_category_budget(id))
}

// ── Categories ────────────────────────────────────────────────

fn cli_categories(args: &[String], db: &Database) -> Result<()> {
    if has_flag(args, "--stats") {
        let sort = match flag_value(args, "--sort") {
            Some(s) => StatsSort::parse(s)
                .ok_or_else(|| anyhow::anyhow!("Unknown sort: {s} (use name, usage or amount)"))?,
            None => StatsSort::Name,
        };
        let stats = arrange_stats(
            db.get_category_stats()?,
            flag_value(args, "--filter").unwrap_or(""),
            sort,
            !has_flag(args, "--desc"),
        );
        if stats.is_empty() {
            println!("No categories");
            return Ok(());
        }
        println!("{:<4} {:<24} {:>8} {:>14}", "ID", "Name", "Expenses", "Total Spent");
        println!("{}", "─".repeat(53));
        for s in &stats {
            println!(
                "{:<4} {:<24} {:>8} {:>14}",
                s.category.id.unwrap_or(0),
                s.category.name,
                s.expense_count,
                format_amount_display(s.total_spent),
            );
        }
        return Ok(());
    }

    let order = if has_flag(args, "--usage") {
        CategoryOrder::MostUsed
    } else {
        CategoryOrder::Name
    };
    let mut categories = db.get_categories()?;
    crate::models::sort_categories(&mut categories, order);
    if categories.is_empty() {
        println!("No categories");
        return Ok(());
    }
    println!("{:<4} {:<24} Used", "ID", "Name");
    println!("{}", "─".repeat(35));
    for cat in &categories {
        println!("{:<4} {:<24} {}", cat.id.unwrap_or(0), cat.name, cat.usage_count);
    }
    Ok(())
}

fn cli_add_category(args: &[String], db: Database) -> Result<()> {
    let pos = positionals(args);
    let Some(name) = pos.first() else {
        anyhow::bail!("Usage: budgetbook add-category <name> [amount] [--month <YYYY-MM>]");
    };
    let initial = match pos.get(1) {
        Some(amount) => match parse_amount(amount) {
            Some(value) => value,
            None => return report(Err(BudgetError::InvalidAmount)),
        },
        None => Decimal::ZERO,
    };
    let mut engine = open_engine(db, flag_value(args, "--month"))?;
    report(engine.add_category(name, initial))
}

fn cli_rename_category(args: &[String], db: Database) -> Result<()> {
    let pos = positionals(args);
    let (Some(old), Some(new)) = (pos.first(), pos.get(1)) else {
        anyhow::bail!("Usage: budgetbook rename-category <old> <new>");
    };
    let mut engine = open_engine(db, None)?;
    let id = category_id(require_category(&engine.categories(CategoryOrder::Name), old)?)?;
    report(engine.rename_category(id, new))
}

fn cli_delete_category(args: &[String], db: Database) -> Result<()> {
    let pos = positionals(args);
    let Some(name) = pos.first() else {
        anyhow::bail!("Usage: budgetbook delete-category <name>");
    };
    let mut engine = open_engine(db, None)?;
    let id = category_id(require_category(&engine.categories(CategoryOrder::Name), name)?)?;
    report(engine.delete_category(id))
}

// ── Expenses ──────────────────────────────────────────────────

fn cli_add_expense(args: &[String], mut db: Database) -> Result<()> {
    let pos = positionals(args);
    let (Some(name), Some(amount)) = (pos.first(), pos.get(1)) else {
        anyhow::bail!("Usage: budgetbook add-expense <category> <amount> [--date <YYYY-MM-DD>] [--note <text>]");
    };
    let categories = db.get_categories()?;
    let category = require_category(&categories, name)?;
    let date = date_arg(flag_value(args, "--date"))?;
    if MonthKey::from_date(date.date()).is_none() {
        return report(Err(BudgetError::InvalidMonth));
    }

    let expense = match new_expense(&categories, category_id(category)?, amount, date, flag_value(args, "--note")) {
        Ok(expense) => expense,
        Err(err) => return report(Err(err)),
    };
    let id = db.insert_expense(&expense)?;
    println!(
        "Expense #{id} added: {} {} on {}",
        category.name,
        format_amount_display(expense.amount),
        expense.date_string()
    );
    Ok(())
}

fn cli_expenses(args: &[String], db: &Database) -> Result<()> {
    let key = month_arg(positionals(args).first().copied())?;
    let expenses = db.get_expenses_for_month(key)?;
    if expenses.is_empty() {
        println!("No expenses for {key}");
        return Ok(());
    }

    let categories = db.get_categories()?;
    println!("{:<6} {:<19} {:<24} {:>12}  Note", "ID", "Date", "Category", "Amount");
    println!("{}", "─".repeat(72));
    for e in &expenses {
        let category = Category::find_by_id(&categories, e.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("?");
        println!(
            "{:<6} {:<19} {:<24} {:>12}  {}",
            e.id.unwrap_or(0),
            e.date_string(),
            category,
            format_amount_display(e.amount),
            e.note.as_deref().unwrap_or(""),
        );
    }
    println!("{}", "─".repeat(72));
    println!(
        "{:<51} {:>12}",
        format!("Total ({} expenses)", expenses.len()),
        format_amount_display(db.get_month_total(key)?)
    );
    Ok(())
}

fn cli_delete_expense(args: &[String], db: &Database) -> Result<()> {
    let id: i64 = positionals(args)
        .first()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| anyhow::anyhow!("Usage: budgetbook delete-expense <id>"))?;
    if !db.delete_expense(id)? {
        anyhow::bail!("Expense #{id} not found");
    }
    println!("Expense #{id} deleted successfully!");
    Ok(())
}

// ── Summary ───────────────────────────────────────────────────

fn cli_summary(args: &[String], db: Database) -> Result<()> {
    let engine = open_engine(db, positionals(args).first().copied())?;
    let summary = engine.summary();

    println!("BudgetBook: {}", summary.key);
    println!("{}", "─".repeat(40));
    println!("  Total budget: {}", format_amount_display(summary.overall));
    println!("  Allocated:    {}", format_amount_display(summary.categorized));
    println!("  Unallocated:  {}", format_amount_display(summary.remaining));
    if summary.over_budget > Decimal::ZERO {
        println!("  Over budget:  {}", format_amount_display(summary.over_budget));
    }
    println!("  Spent:        {}", format_amount_display(summary.total_spent));

    if summary.rows.is_empty() {
        return Ok(());
    }
    println!();
    println!("{:<24} {:>12} {:>12} {:>12}", "Category", "Budget", "Spent", "Left");
    println!("{}", "─".repeat(63));
    for row in &summary.rows {
        let marker = if row.is_overspent() { "  !" } else { "" };
        println!(
            "{:<24} {:>12} {:>12} {:>12}{marker}",
            row.name,
            format_amount_display(row.budgeted),
            format_amount_display(row.spent),
            format_amount_display(row.delta),
        );
    }
    Ok(())
}

// ── Export / import ───────────────────────────────────────────

fn cli_export_json(args: &[String], db: &Database) -> Result<()> {
    let Some(path) = positionals(args).first().map(|p| shellexpand(p)) else {
        anyhow::bail!("Usage: budgetbook export-json <path>");
    };
    let counts = transfer::export_json(db, Path::new(&path))?;
    println!("Data exported successfully! ({counts}) to {path}");
    Ok(())
}

fn cli_import_json(args: &[String], mut db: Database) -> Result<()> {
    let Some(path) = positionals(args).first().map(|p| shellexpand(p)) else {
        anyhow::bail!("Usage: budgetbook import-json <path>");
    };
    let path = Path::new(&path);
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    let counts = transfer::import_json(&mut db, path)?;
    println!("Data imported successfully! ({counts})");
    Ok(())
}

fn cli_export_csv(args: &[String], db: &Database) -> Result<()> {
    let key = month_arg(flag_value(args, "--month"))?;
    let output_path = match positionals(args).first() {
        Some(p) => shellexpand(p),
        None => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            format!("{home}/budgetbook-export-{}.csv", key.date_prefix())
        }
    };

    let count = transfer::export_csv(db, key, Path::new(&output_path))
        .with_context(|| format!("Export to {output_path} failed"))?;
    if count == 0 {
        println!("No expenses for {key}");
    } else {
        println!("Exported {count} expenses to {output_path}");
    }
    Ok(())
}
