use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{parse_date_arg, parse_month};
use crate::error::Result;
use crate::fmt::{dmy, money};
use crate::importer::load_transactions;
use crate::models::DateWindow;
use crate::reports;
use crate::settings::Config;

fn window_arg(from_date: &str, to_date: &str) -> Result<DateWindow> {
    Ok(DateWindow::new(parse_date_arg(from_date)?, parse_date_arg(to_date)?))
}

fn signed(amount: f64) -> String {
    if amount < 0.0 {
        money(amount).red().to_string()
    } else {
        money(amount).green().to_string()
    }
}

pub fn category(config: &Config, name: &str, date: Option<&str>) -> Result<()> {
    let reference = match date {
        Some(raw) => parse_date_arg(raw)?,
        None => chrono::Local::now().date_naive(),
    };
    let transactions = load_transactions(&config.input_path)?;
    let report = reports::spending_by_category(&transactions, name, reference);

    let json = serde_json::to_string(&report)?;
    if let Some(parent) = config.category_report_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&config.category_report_path, &json)?;
    tracing::info!(result = %json, path = %config.category_report_path.display(), "category report written");

    let mut table = Table::new();
    table.set_header(vec!["Category", "From", "To", "Total"]);
    table.add_row(vec![
        Cell::new(&report.category),
        Cell::new(dmy(report.window_start)),
        Cell::new(dmy(report.window_end)),
        Cell::new(signed(report.total_spending)),
    ]);
    println!("Spending by Category\n{table}");
    Ok(())
}

pub fn cashback(config: &Config, month: &str) -> Result<()> {
    let (year, month) = parse_month(month)?;
    let transactions = load_transactions(&config.input_path)?;
    let table_data = reports::cashback_by_category(&transactions, year, month);

    if table_data.is_empty() {
        println!("No cashback in {year:04}-{month:02}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Category", "Cashback"]);
    for (name, total) in table_data.iter() {
        table.add_row(vec![Cell::new(name), Cell::new(total)]);
    }
    let sum: i64 = table_data.iter().map(|(_, total)| total).sum();
    table.add_row(vec![Cell::new("Total".bold()), Cell::new(sum)]);
    println!("Cashback {year:04}-{month:02}\n{table}");
    Ok(())
}

pub fn cards(config: &Config, from_date: &str, to_date: &str) -> Result<()> {
    let window = window_arg(from_date, to_date)?;
    let transactions = load_transactions(&config.input_path)?;
    let cards = reports::card_rollup(&transactions, window);

    if cards.is_empty() {
        println!("No card spending between {} and {}.", dmy(window.start), dmy(window.end));
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Card", "Spent", "Bonuses"]);
    for card in &cards {
        table.add_row(vec![
            Cell::new(format!("*{}", card.last_digits)),
            Cell::new(money(card.total_spent)),
            Cell::new(money(card.bonuses)),
        ]);
    }
    let total: f64 = cards.iter().map(|c| c.total_spent).sum();
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(total)),
        Cell::new(""),
    ]);
    println!("Card Spending {} - {}\n{table}", dmy(window.start), dmy(window.end));
    Ok(())
}

pub fn top(config: &Config, from_date: &str, to_date: &str) -> Result<()> {
    let window = window_arg(from_date, to_date)?;
    let transactions = load_transactions(&config.input_path)?;
    let top = reports::top_transactions(&transactions, window, reports::TOP_TRANSACTIONS_LIMIT);

    if top.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Date", "Amount", "Category", "Description"]);
    for t in &top {
        table.add_row(vec![
            Cell::new(dmy(t.date)),
            Cell::new(signed(t.amount)),
            Cell::new(t.category.as_deref().unwrap_or("—")),
            Cell::new(&t.description),
        ]);
    }
    println!("Top Transactions {} - {}\n{table}", dmy(window.start), dmy(window.end));
    Ok(())
}
