use crate::error::Result;
use crate::fmt::dmy;
use crate::importer::load_transactions;
use crate::settings::{load_user_settings, Config};

pub fn run(config: &Config) -> Result<()> {
    println!("Data dir:       {}", config.data_dir.display());
    println!("Input:          {}", config.input_path.display());
    println!("User settings:  {}", config.user_settings_path.display());
    println!("Report:         {}", config.report_path.display());
    println!("Category log:   {}", config.category_report_path.display());

    if config.user_settings_path.exists() {
        let user = load_user_settings(&config.user_settings_path)?;
        println!();
        println!("Currencies:     {}", list_or_none(&user.user_currencies));
        println!("Stocks:         {}", list_or_none(&user.user_stocks));
    }

    println!();
    if !config.input_path.exists() {
        println!("Input spreadsheet not found. Pass --input or run `cardwise init`.");
        return Ok(());
    }

    let transactions = load_transactions(&config.input_path)?;
    println!("Transactions:   {}", transactions.len());
    let first = transactions.iter().map(|t| t.payment_date).min();
    let last = transactions.iter().map(|t| t.payment_date).max();
    if let (Some(first), Some(last)) = (first, last) {
        println!("Date range:     {} - {}", dmy(first), dmy(last));
    }
    let cards = transactions
        .iter()
        .filter_map(|t| t.card_number.as_deref())
        .collect::<std::collections::BTreeSet<_>>();
    println!("Cards:          {}", cards.len());
    Ok(())
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}
