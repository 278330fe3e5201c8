use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::market::{DEFAULT_QUOTES_URL, DEFAULT_RATES_URL};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default = "default_rates_url")]
    pub rates_url: String,
    #[serde(default = "default_quotes_url")]
    pub quotes_url: String,
}

fn default_rates_url() -> String {
    DEFAULT_RATES_URL.to_string()
}

fn default_quotes_url() -> String {
    DEFAULT_QUOTES_URL.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            rates_url: default_rates_url(),
            quotes_url: default_quotes_url(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("cardwise")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("cardwise")
}

pub fn load_settings() -> Settings {
    read_settings(&settings_path())
}

/// Falls back to defaults when the file is absent or unreadable.
fn read_settings(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    let parsed = std::fs::read_to_string(path)
        .map_err(AppError::from)
        .and_then(|content| serde_json::from_str(&content).map_err(AppError::from));
    match parsed {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring saved settings");
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| AppError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

// ---------------------------------------------------------------------------
// Runtime configuration
// ---------------------------------------------------------------------------

/// Every path and endpoint a command needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub input_path: PathBuf,
    pub user_settings_path: PathBuf,
    pub report_path: PathBuf,
    pub category_report_path: PathBuf,
    pub rates_url: String,
    pub quotes_url: String,
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>, settings: &Settings) -> Self {
        let data_dir = data_dir.into();
        Self {
            input_path: data_dir.join("data").join("operations.xlsx"),
            user_settings_path: data_dir.join("user_settings.json"),
            report_path: data_dir.join("data").join("report.json"),
            category_report_path: data_dir.join("category_report.json"),
            rates_url: settings.rates_url.clone(),
            quotes_url: settings.quotes_url.clone(),
            data_dir,
        }
    }

    /// Saved settings, overridden by `--data-dir` and `--input`.
    pub fn resolve(data_dir: Option<&str>, input: Option<&str>) -> Self {
        let settings = load_settings();
        let dir = data_dir
            .map(shellexpand_path)
            .unwrap_or_else(|| settings.data_dir.clone());
        let mut config = Self::new(dir, &settings);
        if let Some(input) = input {
            config.input_path = PathBuf::from(shellexpand_path(input));
        }
        config
    }
}

// ---------------------------------------------------------------------------
// User settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub user_currencies: Vec<String>,
    #[serde(default)]
    pub user_stocks: Vec<String>,
}

impl UserSettings {
    pub fn template() -> Self {
        Self {
            user_currencies: vec!["USD".to_string(), "EUR".to_string()],
            user_stocks: ["AAPL", "AMZN", "GOOGL", "MSFT", "TSLA"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Missing keys default to empty lists; an unreadable file or malformed
/// JSON is an error.
pub fn load_user_settings(path: &Path) -> Result<UserSettings> {
    let content = std::fs::read_to_string(path)?;
    let settings = serde_json::from_str(&content)?;
    Ok(settings)
}
