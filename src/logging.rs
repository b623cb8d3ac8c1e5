// src/logging.rs

//! `tracing` subscriber for the `graceful` binary.
//!
//! Events are filtered by an [`EnvFilter`] taken from the first of:
//! 1. the `--log-level` flag, applied to every target;
//! 2. the `GRACEFUL_LOG` directives, e.g. `debug` or `graceful=debug,warn`;
//! 3. `info`.
//!
//! Output goes to stderr; stdout belongs to the wrapped command.

use anyhow::Result;
use tracing::warn;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "GRACEFUL_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let (filter, rejected) = select_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    if let Some(err) = rejected {
        warn!(var = LOG_ENV, error = %err, "ignoring invalid log directives");
    }
    Ok(())
}

/// Pick the filter for a flag and an environment value. Unparsable
/// directives fall back to the default and are handed back for reporting.
fn select_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> (EnvFilter, Option<ParseError>) {
    if let Some(level) = cli_level {
        return (EnvFilter::new(level_directive(level)), None);
    }
    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => match EnvFilter::try_new(directives) {
            Ok(filter) => (filter, None),
            Err(err) => (EnvFilter::new(DEFAULT_DIRECTIVES), Some(err)),
        },
        None => (EnvFilter::new(DEFAULT_DIRECTIVES), None),
    }
}

fn level_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
