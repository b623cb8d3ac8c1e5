// src/cli.rs

//! CLI argument parsing using `clap`.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::parse_duration;
use crate::types::{FailureSeverity, SignalName};

/// Command-line arguments for `graceful`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "graceful",
    version,
    about = "Run a command and shut it down gracefully on termination signals.",
    long_about = None
)]
pub struct CliArgs {
    /// Optional TOML config file with a `[shutdown]` section.
    ///
    /// Flags given on the command line override the file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Upper bound for the cleanup phase (e.g. `500ms`, `10s`).
    ///
    /// `0s` removes the bound. Default: 10s.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_arg)]
    pub timeout: Option<Duration>,

    /// Signal that triggers shutdown. Repeatable; replaces the default
    /// set (SIGINT, SIGTERM).
    #[arg(long = "signal", value_name = "NAME", value_parser = parse_signal_arg)]
    pub signals: Vec<SignalName>,

    /// Shell command to run during shutdown. Repeatable; all of them run
    /// concurrently and a non-zero exit counts as a failure.
    #[arg(long = "on-shutdown", value_name = "CMD")]
    pub on_shutdown: Vec<String>,

    /// Request shutdown after this long, as if a signal had arrived.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_arg)]
    pub deadline: Option<Duration>,

    /// How a failing shutdown command is reported.
    #[arg(long, value_enum, value_name = "SEVERITY")]
    pub on_callback_failure: Option<SeverityArg>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `GRACEFUL_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the effective configuration and exit without running anything.
    #[arg(long)]
    pub dry_run: bool,

    /// The primary command. A single argument runs through the shell,
    /// several are executed directly. Without one, `graceful` only waits
    /// for a termination request and then runs the shutdown commands.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Failure severity as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum SeverityArg {
    Warn,
    Fatal,
}

impl From<SeverityArg> for FailureSeverity {
    fn from(value: SeverityArg) -> Self {
        match value {
            SeverityArg::Warn => FailureSeverity::Warn,
            SeverityArg::Fatal => FailureSeverity::Fatal,
        }
    }
}

fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

fn parse_signal_arg(s: &str) -> Result<SignalName, String> {
    s.parse::<SignalName>().map_err(|e| e.to_string())
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
