use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Months, NaiveDate};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::models::{DateWindow, Transaction};

pub const CATEGORY_WINDOW_MONTHS: u32 = 3;
pub const TOP_TRANSACTIONS_LIMIT: usize = 5;

// ---------------------------------------------------------------------------
// Window helpers
// ---------------------------------------------------------------------------

/// `[end - months, end]`. A day that does not exist in the target month
/// clamps to that month's last day (31.05 -> 28.02).
pub fn trailing_months(end: NaiveDate, months: u32) -> DateWindow {
    let start = end.checked_sub_months(Months::new(months)).unwrap_or(NaiveDate::MIN);
    DateWindow::new(start, end)
}

/// From the first day of `date`'s month up to `date`.
pub fn month_to_date(date: NaiveDate) -> DateWindow {
    DateWindow::new(date.with_day(1).unwrap_or(date), date)
}

/// Two decimals, exact ties to even (0.125 -> 0.12, 0.135 -> 0.14).
pub fn round2(val: f64) -> f64 {
    (val * 100.0).round_ties_even() / 100.0
}

fn serialize_dmy<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&crate::fmt::dmy(*date))
}

// ---------------------------------------------------------------------------
// Spending by category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryWindowReport {
    pub category: String,
    #[serde(rename = "start_date", serialize_with = "serialize_dmy")]
    pub window_start: NaiveDate,
    #[serde(rename = "end_date", serialize_with = "serialize_dmy")]
    pub window_end: NaiveDate,
    pub total_spending: f64,
}

pub fn spending_by_category(
    transactions: &[Transaction],
    category: &str,
    reference: NaiveDate,
) -> CategoryWindowReport {
    let window = trailing_months(reference, CATEGORY_WINDOW_MONTHS);
    let total: f64 = transactions
        .iter()
        .filter(|t| window.contains(t.payment_date) && t.in_category(category))
        .map(|t| t.amount)
        .sum();

    CategoryWindowReport {
        category: category.to_string(),
        window_start: window.start,
        window_end: window.end,
        total_spending: total,
    }
}

// ---------------------------------------------------------------------------
// Cashback by category
// ---------------------------------------------------------------------------

/// Category -> whole cashback units, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CashbackTable {
    entries: Vec<(String, i64)>,
}

impl CashbackTable {
    pub fn get(&self, category: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, total)| *total)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(name, total)| (name.as_str(), *total))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for CashbackTable {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(self.entries.len()))?;
        for (name, total) in &self.entries {
            map.serialize_entry(name, total)?;
        }
        map.end()
    }
}

pub fn cashback_by_category(transactions: &[Transaction], year: i32, month: u32) -> CashbackTable {
    let mut entries: Vec<(String, i64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for t in transactions {
        if t.payment_date.year() != year || t.payment_date.month() != month {
            continue;
        }
        let (Some(category), Some(cashback)) = (&t.category, t.cashback) else {
            continue;
        };
        let whole = cashback.trunc() as i64;
        match index.get(category) {
            Some(&i) => entries[i].1 += whole,
            None => {
                index.insert(category.clone(), entries.len());
                entries.push((category.clone(), whole));
            }
        }
    }

    CashbackTable { entries }
}

// ---------------------------------------------------------------------------
// Card rollup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CardTotal {
    pub card_number: String,
    pub last_digits: String,
    /// Net spend, always positive.
    pub total_spent: f64,
    pub bonuses: f64,
}

pub fn last_digits(card_number: &str) -> String {
    let chars: Vec<char> = card_number.chars().collect();
    chars[chars.len().saturating_sub(4)..].iter().collect()
}

/// Net-debit cards in `window`, ascending by full card number.
pub fn card_rollup(transactions: &[Transaction], window: DateWindow) -> Vec<CardTotal> {
    let mut groups: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for t in transactions.iter().filter(|t| window.contains(t.payment_date)) {
        let Some(card) = t.card_number.as_deref() else {
            continue;
        };
        let entry = groups.entry(card).or_default();
        entry.0 += t.amount;
        entry.1 += t.bonus_total;
    }

    let cards: Vec<CardTotal> = groups
        .into_iter()
        .filter(|(_, (spent, _))| *spent < 0.0)
        .map(|(card, (spent, bonuses))| CardTotal {
            card_number: card.to_string(),
            last_digits: last_digits(card),
            total_spent: -spent,
            bonuses,
        })
        .collect();

    let mut seen: HashMap<&str, &str> = HashMap::new();
    for card in &cards {
        if let Some(other) = seen.insert(&card.last_digits, &card.card_number) {
            tracing::warn!(
                suffix = %card.last_digits,
                first = other,
                second = %card.card_number,
                "two cards share the same last digits"
            );
        }
    }

    cards
}

// ---------------------------------------------------------------------------
// Top transactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopTransaction {
    #[serde(serialize_with = "serialize_dmy")]
    pub date: NaiveDate,
    pub amount: f64,
    pub category: Option<String>,
    pub description: String,
}

/// Largest amounts first; equal amounts keep their row order.
pub fn top_transactions(transactions: &[Transaction], window: DateWindow, limit: usize) -> Vec<TopTransaction> {
    let mut in_window: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| window.contains(t.payment_date))
        .collect();
    in_window.sort_by(|a, b| b.amount.total_cmp(&a.amount));

    in_window
        .into_iter()
        .take(limit)
        .map(|t| TopTransaction {
            date: t.payment_date,
            amount: t.amount,
            category: t.category.clone(),
            description: t.description.clone(),
        })
        .collect()
}
