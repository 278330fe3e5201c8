use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::importer::load_transactions;
use crate::market::{fetch_currency_rates, fetch_stock_prices, CurrencyRate, PriceSource, RateSource, StockPrice};
use crate::models::Transaction;
use crate::reports::{card_rollup, month_to_date, round2, top_transactions, TopTransaction, TOP_TRANSACTIONS_LIMIT};
use crate::settings::{load_user_settings, Config, UserSettings};

pub const CARD_CASHBACK_RATE: f64 = 0.01;

// ---------------------------------------------------------------------------
// Greeting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greeting {
    Morning,
    Day,
    Evening,
    Night,
}

impl Greeting {
    pub fn for_hour(hour: u32) -> Self {
        match hour {
            6..=11 => Self::Morning,
            12..=16 => Self::Day,
            17..=21 => Self::Evening,
            _ => Self::Night,
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            Self::Morning => "Доброе утро",
            Self::Day => "Добрый день",
            Self::Evening => "Добрый вечер",
            Self::Night => "Доброй ночи",
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardLine {
    pub last_digits: String,
    pub total_spent: f64,
    pub cashback: f64,
}

/// Stock lookups are the one step whose failure is folded into the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StockPrices {
    Quotes(Vec<StockPrice>),
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub greeting: String,
    pub cards: Vec<CardLine>,
    pub top_transactions: Vec<TopTransaction>,
    pub currency_rates: Vec<CurrencyRate>,
    pub stock_prices: StockPrices,
}

pub struct Sources<'a> {
    pub rates: &'a dyn RateSource,
    pub prices: &'a dyn PriceSource,
}

pub fn build_report(
    transactions: &[Transaction],
    date: NaiveDate,
    user: &UserSettings,
    sources: &Sources<'_>,
    hour: u32,
) -> Result<Report> {
    let greeting = Greeting::for_hour(hour);
    let window = month_to_date(date);

    let cards = card_rollup(transactions, window);
    let top = top_transactions(transactions, window, TOP_TRANSACTIONS_LIMIT);
    let currency_rates = fetch_currency_rates(sources.rates, &user.user_currencies)?;
    let stock_prices = match fetch_stock_prices(sources.prices, &user.user_stocks) {
        Ok(quotes) => StockPrices::Quotes(quotes),
        Err(e) => {
            tracing::warn!(error = %e, "stock prices unavailable");
            StockPrices::Failed { error: e.to_string() }
        }
    };

    let cards = cards
        .into_iter()
        .map(|card| CardLine {
            last_digits: card.last_digits,
            total_spent: round2(card.total_spent),
            cashback: round2(card.total_spent * CARD_CASHBACK_RATE),
        })
        .collect();

    Ok(Report {
        greeting: greeting.text().to_string(),
        cards,
        top_transactions: top,
        currency_rates,
        stock_prices,
    })
}

/// Pretty JSON with four-space indentation.
pub fn render_report(report: &Report) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    report.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn write_report(path: &Path, json: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)?;
    tracing::info!(path = %path.display(), "report written");
    Ok(())
}

/// Load, aggregate, fetch, persist and return the JSON report.
pub fn generate_report(config: &Config, date: NaiveDate, sources: &Sources<'_>, hour: u32) -> Result<String> {
    let user = load_user_settings(&config.user_settings_path)?;
    let transactions = load_transactions(&config.input_path)?;
    let report = build_report(&transactions, date, &user, sources, hour)?;
    let json = render_report(&report)?;
    write_report(&config.report_path, &json)?;
    Ok(json)
}
