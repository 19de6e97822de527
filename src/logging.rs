//! Diagnostic logging to stderr.
//!
//! Stdout carries the interactive protocol, so nothing here ever writes to
//! it.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive, e.g.
/// `REWIND_LOG=rewind::process=debug`.
pub const LOG_ENV: &str = "REWIND_LOG";

pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "warn"
    }
}

/// Installs the global subscriber. Calling it twice is harmless.
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}
