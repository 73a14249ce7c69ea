//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Levels:
//! - `warn` (default): recoverable problems, e.g. starting from an empty project
//! - `info` (`-v`): document saves and exports
//! - `debug` (`-vv`): loads and individual mutations
//! - `trace` (`-vvv`): everything
//!
//! `RUST_LOG` overrides the verbosity flag when set. Logs go to stderr so
//! `--json` output on stdout stays machine-readable.

use std::io;

use anyhow::{anyhow, Result};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    /// Include the module path of each event.
    pub with_target: bool,
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: Level::WARN, with_target: false, with_ansi: true }
    }
}

impl LogConfig {
    /// Map a `-v` count to a level: 0 warn, 1 info, 2 debug, 3+ trace.
    #[must_use]
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self { level, ..Default::default() }
    }

    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }
}

/// Build an `EnvFilter` from the given level, respecting `RUST_LOG`.
pub fn build_env_filter(level: Level) -> EnvFilter {
    let level_str = level.as_str().to_lowercase();
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Our crates follow the flag; dependencies stay at warn.
        EnvFilter::new(format!("warn,exemap={level_str},exemap_core={level_str}"))
    })
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(config.level))
        .with_writer(io::stderr)
        .with_target(config.with_target)
        .with_ansi(config.with_ansi)
        .without_time()
        .try_init()
        .map_err(|err| anyhow!("Failed to initialize logging: {err}"))
}
