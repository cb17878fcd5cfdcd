//! Log setup for the driver binary
//!
//! Messages go to stderr as `LEVEL message`, without timestamps or targets.
//! `RUST_LOG` takes precedence over the `--debug` switch.

use tracing_subscriber::{fmt, EnvFilter};

/// Default filter directive for the given verbosity
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}
