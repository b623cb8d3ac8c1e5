// src/engine/mod.rs

//! Shutdown orchestration engine.
//!
//! A cycle races the primary workload against the termination listener.
//! If termination wins, the watchdog is armed and the cleanup callbacks are
//! dispatched; the cycle ends when they all return or the watchdog fires.
//!
//! The pure state machine lives in [`core`]; the async/IO shell that
//! spawns tasks and awaits the races is implemented in [`runtime`].

use std::time::Duration;

use crate::exec::{CleanupReport, WorkloadExit};
use crate::signal::TerminationCause;

/// Phase of a shutdown cycle.
///
/// `Idle → Running → {CompletedNormally | Terminating} → CleaningUp →
/// {Done | ForceTerminated}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    CompletedNormally,
    Terminating,
    CleaningUp,
    Done,
    ForceTerminated,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Phase::CompletedNormally | Phase::Done | Phase::ForceTerminated
        )
    }
}

/// Events flowing into the cycle core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleEvent {
    /// The execution method was invoked.
    Started,
    /// The primary workload finished before any termination request.
    WorkloadFinished(WorkloadExit),
    /// A signal arrived or the token was cancelled.
    TerminationRequested(TerminationCause),
    /// Every cleanup callback returned.
    CleanupFinished(CleanupReport),
    /// The watchdog fired before cleanup finished.
    WatchdogFired,
}

/// Severity of a log line requested by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Fatal,
}

/// What the async shell should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleCommand {
    /// Install signal handlers and start watching the token.
    Listen,
    /// Spawn the primary workload.
    SpawnWorkload,
    Log(LogLevel, String),
    /// Start the watchdog timer.
    ArmWatchdog(Duration),
    /// Start every cleanup callback.
    DispatchCleanup,
    DisarmWatchdog,
    /// Stop waiting for callbacks that are still running.
    AbandonCleanup,
    /// Invoke the terminator with this exit code.
    Terminate(i32),
}

/// Result of feeding one event into the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleStep {
    pub commands: Vec<CycleCommand>,
    pub phase: Phase,
}

/// How a cycle ended, as seen by the caller of the execution method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The workload finished first; no cleanup ran.
    CompletedNormally(WorkloadExit),
    /// Termination was requested and every cleanup callback returned.
    Done {
        cause: TerminationCause,
        report: CleanupReport,
    },
    /// The watchdog fired; the terminator has been invoked.
    ForceTerminated { cause: TerminationCause },
}

pub mod core;
pub mod runtime;

pub use self::core::CycleCore;
pub use self::runtime::CycleRuntime;
