use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "excel")]
    #[error("Spreadsheet error: {0}")]
    Excel(#[from] calamine::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Row {row}: cannot read payment date '{value}'")]
    BadDate { row: usize, value: String },

    #[error("Row {row}: cannot read amount '{value}'")]
    BadAmount { row: usize, value: String },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Spreadsheet has no rows: {0}")]
    EmptySheet(String),

    #[error("Invalid date: {0} (expected YYYY-MM-DD or DD.MM.YYYY)")]
    InvalidDate(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
