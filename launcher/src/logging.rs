//! Operator-facing progress logging.
//!
//! Events go to stderr so stdout stays reserved for the external tool's
//! output (captured dump results, streamed generation logs).

use std::io::IsTerminal;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`; when unset, uses `default_level` (`info` normally,
/// `debug` for `dump --verbose`).
///
/// # Example
/// ```bash
/// RUST_LOG=launcher=debug miaoma gen -o out
/// ```
pub fn init(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false)
                .compact(),
        )
        .init();
}
