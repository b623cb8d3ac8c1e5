// src/host.rs

//! Capabilities the host hands to the orchestrator.
//!
//! The orchestrator never logs through a global and never calls the
//! process exit primitive itself. It talks to:
//! - a [`LogSink`] for informational, warning and fatal lines
//! - a [`Terminator`] for forced termination
//!
//! Production code uses [`TracingSink`] and [`ProcessExit`]; tests inject
//! recording implementations so a forced kill does not take down the test
//! binary.

use tracing::{error, info, warn};

/// Destination for the orchestrator's log lines.
///
/// Must tolerate concurrent calls from several cleanup tasks and the
/// watchdog at once.
pub trait LogSink: Send + Sync {
    fn info(&self, message: &str);

    /// Defaults to [`LogSink::info`].
    fn warn(&self, message: &str) {
        self.info(message);
    }

    /// Logs only. Termination is the [`Terminator`]'s job.
    fn fatal(&self, message: &str);
}

/// Default sink: forwards to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn info(&self, message: &str) {
        info!("{message}");
    }

    fn warn(&self, message: &str) {
        warn!("{message}");
    }

    fn fatal(&self, message: &str) {
        error!(fatal = true, "{message}");
    }
}

/// Forced termination of the host process.
pub trait Terminator: Send + Sync {
    /// Ends the process with the given exit code.
    ///
    /// Test implementations may return; the orchestrator then stops waiting
    /// on whatever it was waiting for.
    fn terminate(&self, code: i32);
}

/// Default terminator: `std::process::exit`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExit;

impl Terminator for ProcessExit {
    fn terminate(&self, code: i32) {
        std::process::exit(code);
    }
}

/// Exit code used for every forced termination.
pub const FORCED_EXIT_CODE: i32 = 1;
