use chrono::NaiveDate;

/// One spreadsheet record after column resolution and cell conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub payment_date: NaiveDate,
    pub amount: f64,
    pub category: Option<String>,
    pub description: String,
    pub card_number: Option<String>,
    /// "Бонусы (включая кэшбэк)"; blank cells load as 0.
    pub bonus_total: f64,
    /// "Кэшбэк"; blank cells stay `None`.
    pub cashback: Option<f64>,
}

impl Transaction {
    pub fn in_category(&self, category: &str) -> bool {
        self.category.as_deref() == Some(category)
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
