//! Diagnostic logging to stderr.

use std::io;

use tracing_subscriber::EnvFilter;

/// Environment variable holding a log filter such as `cq_search=debug`.
pub const LOG_ENV: &str = "CQ_LOG";

/// Installs the global subscriber.
///
/// `CQ_LOG` wins when set; otherwise each `-v` raises the level from `warn`.
pub fn init(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
    {
        eprintln!("warning: could not install logging: {e}");
    }
}
