mod cli;
mod error;
mod fmt;
mod importer;
mod logging;
mod market;
mod models;
mod reports;
mod settings;
mod summary;

use clap::Parser;

use cli::{Cli, Commands};
use settings::Config;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = Config::resolve(cli.data_dir.as_deref(), cli.input.as_deref());
    tracing::debug!(data_dir = %config.data_dir.display(), input = %config.input_path.display(), "resolved config");

    let result = match cli.command {
        Commands::Init => cli::init::run(cli.data_dir),
        Commands::Report { date } => cli::summary::run(&config, &date),
        Commands::Category { name, date } => cli::report::category(&config, &name, date.as_deref()),
        Commands::Cashback { month } => cli::report::cashback(&config, &month),
        Commands::Cards { from_date, to_date } => cli::report::cards(&config, &from_date, &to_date),
        Commands::Top { from_date, to_date } => cli::report::top(&config, &from_date, &to_date),
        Commands::Status => cli::status::run(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
