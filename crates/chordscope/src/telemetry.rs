//! Log output for the CLI.

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `level`.
///
/// `level` is any `EnvFilter` directive ("debug", "chord_midi=trace,info").
/// An unparseable directive falls back to `info` with a warning.
pub fn init(level: &str) {
    let (filter, rejected) = match EnvFilter::try_new(level) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new("info"), Some(e)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(e) = rejected {
        tracing::warn!(level, error = %e, "invalid log level, using info");
    }
}
