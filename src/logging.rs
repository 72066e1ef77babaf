//! Diagnostic logging to stderr.

use std::io::IsTerminal;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

/// Environment variable holding the log filter, e.g. `AMAPI_LOG=amapi=debug`
pub const LOG_ENV_VAR: &str = "AMAPI_LOG";

/// Logs go to stderr so stdout stays reserved for response bodies.
pub fn init() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}
