//! Logging setup shared by the Iris binaries

use tracing_subscriber::{fmt, EnvFilter};

/// Build the filter: `RUST_LOG` wins, then `debug` when verbose, then the
/// configured default directive.
pub fn env_filter(default_level: &str, verbose: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let directive = if verbose { "debug" } else { default_level };
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a global fmt subscriber writing to stderr, keeping stdout free
/// for machine-readable output.
pub fn init_tracing(default_level: &str, verbose: bool) -> Result<(), String> {
    let subscriber = fmt()
        .with_env_filter(env_filter(default_level, verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("failed to set tracing subscriber: {e}"))
}
