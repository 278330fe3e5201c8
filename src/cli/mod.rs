pub mod init;
pub mod report;
pub mod status;
pub mod summary;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::error::{AppError, Result};

/// Accepts `YYYY-MM-DD` or the bank export's `DD.MM.YYYY`.
pub(crate) fn parse_date_arg(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d.%m.%Y"))
        .map_err(|_| AppError::InvalidDate(raw.to_string()))
}

/// `YYYY-MM` -> (year, month).
pub(crate) fn parse_month(raw: &str) -> Result<(i32, u32)> {
    let invalid = || AppError::Other(format!("Invalid month: {raw} (expected YYYY-MM)"));
    let (y, m) = raw.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = y.parse().map_err(|_| invalid())?;
    let month: u32 = m.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

#[derive(Parser)]
#[command(
    name = "cardwise",
    version,
    about = "Card spending, cashback and market snapshot reports from bank spreadsheet exports."
)]
pub struct Cli {
    /// Data directory (default: saved setting, ~/Documents/cardwise)
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<String>,
    /// Transactions spreadsheet (default: <data-dir>/data/operations.xlsx)
    #[arg(long, global = true)]
    pub input: Option<String>,
    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save the data directory and create a template user_settings.json.
    Init,
    /// Build the JSON report for the month up to DATE, save it and print it.
    Report {
        /// Report date: YYYY-MM-DD
        date: String,
    },
    /// Spending in one category over the three months up to a date.
    Category {
        /// Category name, matched exactly
        name: String,
        /// Reference date (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Whole cashback per category for one month.
    Cashback {
        /// Month: YYYY-MM
        #[arg(long)]
        month: String,
    },
    /// Net spend and bonuses per card.
    Cards {
        /// Start date (inclusive)
        #[arg(long = "from")]
        from_date: String,
        /// End date (inclusive)
        #[arg(long = "to")]
        to_date: String,
    },
    /// The five largest transactions in a date range.
    Top {
        /// Start date (inclusive)
        #[arg(long = "from")]
        from_date: String,
        /// End date (inclusive)
        #[arg(long = "to")]
        to_date: String,
    },
    /// Show resolved paths and what the input spreadsheet contains.
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_arg() {
        let expected = NaiveDate::from_ymd_opt(2023, 5, 20).unwrap();
        assert_eq!(parse_date_arg("2023-05-20").unwrap(), expected);
        assert_eq!(parse_date_arg("20.05.2023").unwrap(), expected);
        assert!(matches!(parse_date_arg("2023.05.20"), Err(AppError::InvalidDate(_))));
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2023-11").unwrap(), (2023, 11));
        assert!(parse_month("2023-13").is_err());
        assert!(parse_month("11.2023").is_err());
        assert!(parse_month("2023").is_err());
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "cardwise", "cards", "--from", "2023-05-01", "--to", "2023-05-20", "--input", "ops.csv",
        ])
        .unwrap();
        assert_eq!(cli.input.as_deref(), Some("ops.csv"));
        assert!(matches!(cli.command, Commands::Cards { .. }));
    }
}
