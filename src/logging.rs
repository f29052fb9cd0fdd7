//! Log output for the `downloadutil` binary.
//!
//! The library emits records through the `log` facade, at `info` for
//! verbose downloads and `debug` otherwise. The binary installs a
//! `tracing-subscriber` formatter on stderr, which also captures `log`
//! records.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Install the stderr subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber or logger is already installed.
pub fn init_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init()
}
