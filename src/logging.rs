use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::EnvFilter;

fn resolve_env_filter(verbose: bool) -> EnvFilter {
    if let Ok(level) = std::env::var("CARDWISE_LOG") {
        if let Ok(filter) = EnvFilter::try_new(level) {
            return filter;
        }
    }
    if verbose {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the stderr subscriber. Stdout stays reserved for command output.
///
/// Environment variables:
/// - `CARDWISE_LOG`: level/filter override (`info`, `cardwise=debug`, ...).
/// - `RUST_LOG`: used when `CARDWISE_LOG` is unset and `--verbose` is off.
pub fn init(verbose: bool) {
    let layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = tracing_subscriber::registry()
        .with(resolve_env_filter(verbose))
        .with(layer)
        .try_init();
}
