use std::path::Path;

use chrono::{Days, NaiveDate};

use crate::error::{AppError, Result};
use crate::models::Transaction;

pub const COL_PAYMENT_DATE: &str = "Дата платежа";
pub const COL_AMOUNT: &str = "Сумма платежа";
pub const COL_CATEGORY: &str = "Категория";
pub const COL_DESCRIPTION: &str = "Описание";
pub const COL_CARD_NUMBER: &str = "Номер карты";
pub const COL_BONUS_TOTAL: &str = "Бонусы (включая кэшбэк)";
pub const COL_CASHBACK: &str = "Кэшбэк";

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// A spreadsheet cell reduced to what the loader cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    fn text(raw: &str) -> Self {
        if raw.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(raw.to_string())
        }
    }

    fn render(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Date(d) => crate::fmt::dmy(*d),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a bank-export amount: "-1 234,56", "160.89", "1\u{a0}000".
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\u{202f}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if s.is_empty() {
        return None;
    }
    s.parse().ok()
}

/// Parse "dd.mm.yyyy", ignoring a trailing time part.
pub fn parse_date_dmy(raw: &str) -> Option<NaiveDate> {
    let day = raw.split_whitespace().next()?;
    NaiveDate::parse_from_str(day, "%d.%m.%Y").ok()
}

/// `None` for negative, non-finite or out-of-calendar serials.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_days(Days::new(serial.floor() as u64))
}

fn date_cell(cell: &Cell, row: usize) -> Result<Option<NaiveDate>> {
    let bad = || AppError::BadDate {
        row,
        value: cell.render(),
    };
    match cell {
        Cell::Empty => Ok(None),
        Cell::Date(d) => Ok(Some(*d)),
        Cell::Number(serial) => excel_serial_to_date(*serial).map(Some).ok_or_else(bad),
        Cell::Text(s) => parse_date_dmy(s).map(Some).ok_or_else(bad),
    }
}

fn number_cell(cell: &Cell, row: usize) -> Result<Option<f64>> {
    match cell {
        Cell::Empty => Ok(None),
        Cell::Number(n) => Ok(Some(*n)),
        Cell::Text(s) => parse_amount(s).map(Some).ok_or_else(|| AppError::BadAmount {
            row,
            value: s.clone(),
        }),
        Cell::Date(_) => Err(AppError::BadAmount {
            row,
            value: cell.render(),
        }),
    }
}

fn text_cell(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Empty => None,
        other => Some(other.render()).filter(|s| !s.is_empty()),
    }
}

// ---------------------------------------------------------------------------
// Column layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Layout {
    payment_date: usize,
    amount: usize,
    category: usize,
    description: usize,
    card_number: usize,
    bonus_total: Option<usize>,
    cashback: Option<usize>,
}

impl Layout {
    fn from_header(header: &[Cell]) -> Result<Self> {
        let names: Vec<String> = header.iter().map(Cell::render).collect();
        let find = |name: &str| names.iter().position(|h| h == name);
        let require = |name: &str| find(name).ok_or_else(|| AppError::MissingColumn(name.to_string()));
        Ok(Self {
            payment_date: require(COL_PAYMENT_DATE)?,
            amount: require(COL_AMOUNT)?,
            category: require(COL_CATEGORY)?,
            description: require(COL_DESCRIPTION)?,
            card_number: require(COL_CARD_NUMBER)?,
            bonus_total: find(COL_BONUS_TOTAL),
            cashback: find(COL_CASHBACK),
        })
    }

    fn to_transaction(&self, cells: &[Cell], row: usize) -> Result<Option<Transaction>> {
        let at = |idx: usize| cells.get(idx).unwrap_or(&EMPTY);
        let optional = |idx: Option<usize>| idx.map_or(&EMPTY, at);

        let Some(payment_date) = date_cell(at(self.payment_date), row)? else {
            return Ok(None);
        };
        let amount = number_cell(at(self.amount), row)?.ok_or_else(|| AppError::BadAmount {
            row,
            value: String::new(),
        })?;

        Ok(Some(Transaction {
            payment_date,
            amount,
            category: text_cell(at(self.category)),
            description: text_cell(at(self.description)).unwrap_or_default(),
            card_number: text_cell(at(self.card_number)),
            bonus_total: number_cell(optional(self.bonus_total), row)?.unwrap_or(0.0),
            cashback: number_cell(optional(self.cashback), row)?,
        }))
    }
}

/// Turn raw rows (header first) into transactions. Rows with a blank
/// payment date are skipped.
pub fn transactions_from_rows(rows: &[Vec<Cell>]) -> Result<Vec<Transaction>> {
    let Some((header, body)) = rows.split_first() else {
        return Err(AppError::EmptySheet("no header row".to_string()));
    };
    let layout = Layout::from_header(header)?;

    let mut transactions = Vec::with_capacity(body.len());
    let mut skipped = 0usize;
    for (i, cells) in body.iter().enumerate() {
        if cells.iter().all(|c| *c == Cell::Empty) {
            continue;
        }
        // header is line 1
        match layout.to_transaction(cells, i + 2)? {
            Some(txn) => transactions.push(txn),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, "rows without a payment date ignored");
    }
    Ok(transactions)
}

// ---------------------------------------------------------------------------
// load_transactions
// ---------------------------------------------------------------------------

pub fn load_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let rows = match ext.as_str() {
        "csv" => read_csv_rows(path)?,
        #[cfg(feature = "excel")]
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook_rows(path)?,
        _ => return Err(AppError::UnsupportedFormat(path.display().to_string())),
    };

    let transactions = transactions_from_rows(&rows)?;
    tracing::debug!(path = %path.display(), count = transactions.len(), "loaded transactions");
    Ok(transactions)
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn detect_delimiter(header_line: &str) -> u8 {
    if header_line.matches(';').count() > header_line.matches(',').count() {
        b';'
    } else {
        b','
    }
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let content = std::fs::read_to_string(path)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    let delimiter = detect_delimiter(content.lines().next().unwrap_or(""));

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::text).collect());
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Workbook reader (feature-gated)
// ---------------------------------------------------------------------------

#[cfg(feature = "excel")]
fn cell_from_data(data: &calamine::Data) -> Cell {
    use calamine::Data;
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()).map_or(Cell::Empty, Cell::Date),
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map_or_else(|| Cell::text(s), Cell::Date),
        Data::DurationIso(s) => Cell::text(s),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

#[cfg(feature = "excel")]
fn read_workbook_rows(path: &Path) -> Result<Vec<Vec<Cell>>> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::EmptySheet(path.display().to_string()))??;
    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect())
}
