//! Logging setup for the todo binary.
//!
//! Logs go to stderr so they never mix with command output. `RUST_LOG`
//! wins over the verbosity flags when it is set.

use tracing_subscriber::EnvFilter;

/// Maps `-v` counts to a default filter.
fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

pub fn init_stderr_logging(verbose: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
