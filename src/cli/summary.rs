use chrono::Timelike;

use crate::cli::parse_date_arg;
use crate::error::Result;
use crate::market::{CbrClient, YahooClient};
use crate::settings::Config;
use crate::summary::{generate_report, Sources};

pub fn run(config: &Config, date: &str) -> Result<()> {
    let date = parse_date_arg(date)?;
    let rates = CbrClient::new(&config.rates_url)?;
    let prices = YahooClient::new(&config.quotes_url)?;
    let sources = Sources {
        rates: &rates,
        prices: &prices,
    };
    let hour = chrono::Local::now().hour();

    let json = generate_report(config, date, &sources, hour)?;
    println!("{json}");
    Ok(())
}
