use std::collections::HashMap;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::reports::round2;

pub const DEFAULT_RATES_URL: &str = "https://www.cbr-xml-daily.ru/daily_json.js";
pub const DEFAULT_QUOTES_URL: &str = "https://query1.finance.yahoo.com";

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RateEntry {
    #[serde(rename = "Value")]
    pub value: f64,
}

/// Daily rates document keyed by currency code.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyRates {
    #[serde(rename = "Valute", default)]
    pub valute: HashMap<String, RateEntry>,
}

pub trait RateSource {
    fn daily_rates(&self) -> Result<DailyRates>;
}

pub trait PriceSource {
    /// Most recent daily close over the trailing month, `None` when the
    /// provider has no history for `symbol`.
    fn latest_close(&self, symbol: &str) -> Result<Option<f64>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyRate {
    pub currency: String,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockPrice {
    pub stock: String,
    pub price: f64,
}

/// Rates for `codes` in the order given. Codes missing from the provider
/// response are left out; repeated codes appear once.
pub fn fetch_currency_rates(source: &dyn RateSource, codes: &[String]) -> Result<Vec<CurrencyRate>> {
    if codes.is_empty() {
        return Ok(Vec::new());
    }
    let daily = source.daily_rates()?;

    let mut rates: Vec<CurrencyRate> = Vec::new();
    for code in codes {
        if rates.iter().any(|r| &r.currency == code) {
            continue;
        }
        if let Some(entry) = daily.valute.get(code) {
            rates.push(CurrencyRate {
                currency: code.clone(),
                rate: entry.value,
            });
        }
    }
    tracing::debug!(requested = codes.len(), found = rates.len(), "currency rates");
    Ok(rates)
}

/// Latest close for each symbol, rounded to cents. The first provider
/// error aborts the whole lookup.
pub fn fetch_stock_prices(source: &dyn PriceSource, symbols: &[String]) -> Result<Vec<StockPrice>> {
    let mut prices = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        match source.latest_close(symbol)? {
            Some(close) => prices.push(StockPrice {
                stock: symbol.clone(),
                price: round2(close),
            }),
            None => tracing::debug!(symbol = %symbol, "no price history"),
        }
    }
    Ok(prices)
}

fn http_client() -> Result<Client> {
    let client = Client::builder()
        .user_agent(concat!("cardwise/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

// ---------------------------------------------------------------------------
// Central bank daily rates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CbrClient {
    http: Client,
    url: String,
}

impl CbrClient {
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            url: url.to_string(),
        })
    }
}

impl RateSource for CbrClient {
    fn daily_rates(&self) -> Result<DailyRates> {
        tracing::debug!(url = %self.url, "fetching currency rates");
        let rates = self
            .http
            .get(&self.url)
            .send()?
            .error_for_status()?
            .json::<DailyRates>()?;
        Ok(rates)
    }
}

// ---------------------------------------------------------------------------
// Yahoo chart quotes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct ChartResult {
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

fn last_close(symbol: &str, response: ChartResponse) -> Result<Option<f64>> {
    if let Some(err) = response.chart.error {
        return Err(AppError::Provider(format!(
            "{symbol}: {} ({})",
            err.description, err.code
        )));
    }
    let close = response
        .chart
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|r| r.indicators.quote.into_iter().next())
        .and_then(|q| q.close.into_iter().flatten().last());
    Ok(close)
}

#[derive(Debug, Clone)]
pub struct YahooClient {
    http: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl PriceSource for YahooClient {
    fn latest_close(&self, symbol: &str) -> Result<Option<f64>> {
        let url = format!("{}/v8/finance/chart/{symbol}", self.base_url);
        tracing::debug!(url = %url, "fetching price history");
        let response = self
            .http
            .get(&url)
            .query(&[("range", "1mo"), ("interval", "1d")])
            .send()?;
        let status = response.status();
        let body: ChartResponse = match response.json() {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(AppError::Provider(format!("{symbol}: HTTP {status}")));
            }
            Err(e) => return Err(e.into()),
        };
        last_close(symbol, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FixedRates(&'static str);

    impl RateSource for FixedRates {
        fn daily_rates(&self) -> Result<DailyRates> {
            Ok(serde_json::from_str(self.0)?)
        }
    }

    struct FailingRates;

    impl RateSource for FailingRates {
        fn daily_rates(&self) -> Result<DailyRates> {
            Err(AppError::Provider("rates offline".to_string()))
        }
    }

    struct FakePrices {
        closes: Vec<(&'static str, Option<f64>)>,
        calls: RefCell<Vec<String>>,
    }

    impl PriceSource for FakePrices {
        fn latest_close(&self, symbol: &str) -> Result<Option<f64>> {
            self.calls.borrow_mut().push(symbol.to_string());
            self.closes
                .iter()
                .find(|(s, _)| *s == symbol)
                .map(|(_, close)| *close)
                .ok_or_else(|| AppError::Provider(format!("unknown symbol {symbol}")))
        }
    }

    const CBR_SAMPLE: &str = r#"{
        "Date": "2023-05-20T11:30:00+03:00",
        "Valute": {
            "USD": {"ID": "R01235", "CharCode": "USD", "Nominal": 1, "Value": 79.9649},
            "EUR": {"ID": "R01239", "CharCode": "EUR", "Nominal": 1, "Value": 86.4918},
            "CNY": {"ID": "R01375", "CharCode": "CNY", "Nominal": 1, "Value": 11.3762}
        }
    }"#;

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_currency_rates_follow_requested_order() {
        let rates = fetch_currency_rates(&FixedRates(CBR_SAMPLE), &codes(&["EUR", "XXX", "USD", "EUR"])).unwrap();
        assert_eq!(
            rates,
            vec![
                CurrencyRate { currency: "EUR".into(), rate: 86.4918 },
                CurrencyRate { currency: "USD".into(), rate: 79.9649 },
            ]
        );
    }

    #[test]
    fn test_currency_rates_empty_request_skips_fetch() {
        assert!(fetch_currency_rates(&FailingRates, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_currency_provider_failure_propagates() {
        assert!(matches!(
            fetch_currency_rates(&FailingRates, &codes(&["USD"])),
            Err(AppError::Provider(_))
        ));
    }

    #[test]
    fn test_stock_prices_round_and_skip_empty_history() {
        let source = FakePrices {
            closes: vec![("AAPL", Some(175.0549)), ("DELISTED", None), ("MSFT", Some(318.3))],
            calls: RefCell::new(Vec::new()),
        };
        let prices = fetch_stock_prices(&source, &codes(&["AAPL", "DELISTED", "MSFT"])).unwrap();
        assert_eq!(
            prices,
            vec![
                StockPrice { stock: "AAPL".into(), price: 175.05 },
                StockPrice { stock: "MSFT".into(), price: 318.3 },
            ]
        );
    }

    #[test]
    fn test_stock_prices_abort_on_first_error() {
        let source = FakePrices {
            closes: vec![("AAPL", Some(1.0)), ("MSFT", Some(2.0))],
            calls: RefCell::new(Vec::new()),
        };
        let result = fetch_stock_prices(&source, &codes(&["AAPL", "BOGUS", "MSFT"]));
        assert!(result.is_err());
        assert_eq!(*source.calls.borrow(), vec!["AAPL".to_string(), "BOGUS".to_string()]);
    }

    #[test]
    fn test_last_close_skips_trailing_nulls() {
        let body: ChartResponse = serde_json::from_str(
            r#"{"chart": {"result": [{"meta": {"symbol": "AAPL"},
                "indicators": {"quote": [{"close": [170.1, 171.25, null]}]}}], "error": null}}"#,
        )
        .unwrap();
        assert_eq!(last_close("AAPL", body).unwrap(), Some(171.25));
    }

    #[test]
    fn test_last_close_without_history() {
        let body: ChartResponse = serde_json::from_str(
            r#"{"chart": {"result": [{"indicators": {"quote": [{}]}}], "error": null}}"#,
        )
        .unwrap();
        assert_eq!(last_close("NEW", body).unwrap(), None);
    }

    #[test]
    fn test_last_close_provider_error() {
        let body: ChartResponse = serde_json::from_str(
            r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#,
        )
        .unwrap();
        let err = last_close("BOGUS", body).unwrap_err();
        assert!(err.to_string().contains("BOGUS"));
    }
}
