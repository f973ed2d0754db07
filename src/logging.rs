//! Diagnostic logging to stderr.
//!
//! Filtered by `RUST_LOG`, e.g. `RUST_LOG=review_outline=debug` or
//! `RUST_LOG=review_outline::session=trace`. Defaults to warnings only so
//! stdout stays clean for command output.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Install the global subscriber. Calling it twice is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_err| return EnvFilter::new("warn"));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}
