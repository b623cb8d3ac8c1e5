// src/engine/core.rs

//! Pure shutdown-cycle state machine.
//!
//! [`CycleCore`] consumes [`CycleEvent`]s and produces the next phase plus
//! the commands the async shell must execute, in order. It owns no tasks,
//! timers or channels, so every ordering rule can be unit tested
//! synchronously:
//! - the watchdog is armed before cleanup is dispatched
//! - it is disarmed once cleanup finishes
//! - cleanup is dispatched at most once per cycle
//! - events that make no sense in the current phase are ignored

use std::time::Duration;

use crate::engine::{CycleCommand, CycleEvent, CycleStep, LogLevel, Phase};
use crate::exec::{CleanupReport, WorkloadExit};
use crate::host::FORCED_EXIT_CODE;
use crate::signal::TerminationCause;
use crate::types::FailureSeverity;

#[derive(Debug, Clone)]
pub struct CycleCore {
    phase: Phase,
    timeout: Option<Duration>,
    severity: FailureSeverity,
    watchdog_armed: bool,
    cause: Option<TerminationCause>,
}

impl CycleCore {
    pub fn new(timeout: Option<Duration>, severity: FailureSeverity) -> Self {
        Self {
            phase: Phase::Idle,
            timeout: timeout.filter(|t| !t.is_zero()),
            severity,
            watchdog_armed: false,
            cause: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// What triggered termination, once it has been requested.
    pub fn cause(&self) -> Option<TerminationCause> {
        self.cause
    }

    pub fn step(&mut self, event: CycleEvent) -> CycleStep {
        let commands = match (self.phase, event) {
            (Phase::Idle, CycleEvent::Started) => {
                self.phase = Phase::Running;
                vec![CycleCommand::Listen, CycleCommand::SpawnWorkload]
            }
            (Phase::Running, CycleEvent::WorkloadFinished(exit)) => self.complete_normally(exit),
            (Phase::Running, CycleEvent::TerminationRequested(cause)) => self.terminate(cause),
            (Phase::CleaningUp, CycleEvent::CleanupFinished(report)) => self.finish(report),
            (Phase::CleaningUp, CycleEvent::WatchdogFired) => {
                self.phase = Phase::ForceTerminated;
                self.watchdog_armed = false;
                vec![CycleCommand::AbandonCleanup]
            }
            _ => Vec::new(),
        };

        CycleStep {
            commands,
            phase: self.phase,
        }
    }

    fn complete_normally(&mut self, exit: WorkloadExit) -> Vec<CycleCommand> {
        self.phase = Phase::CompletedNormally;
        match exit {
            WorkloadExit::Panicked(msg) => vec![CycleCommand::Log(
                LogLevel::Warn,
                format!("primary workload panicked: {msg}"),
            )],
            WorkloadExit::Aborted => vec![CycleCommand::Log(
                LogLevel::Warn,
                "primary workload was aborted".to_string(),
            )],
            WorkloadExit::Returned | WorkloadExit::Skipped => Vec::new(),
        }
    }

    fn terminate(&mut self, cause: TerminationCause) -> Vec<CycleCommand> {
        self.phase = Phase::Terminating;
        self.cause = Some(cause);

        let reason = match cause {
            TerminationCause::Signal(name) => format!("received {name}"),
            TerminationCause::Cancelled => "context cancelled".to_string(),
        };
        let mut commands = vec![CycleCommand::Log(
            LogLevel::Info,
            format!("shutdown initiated ({reason})"),
        )];

        if let Some(timeout) = self.timeout {
            self.watchdog_armed = true;
            commands.push(CycleCommand::ArmWatchdog(timeout));
        }
        commands.push(CycleCommand::DispatchCleanup);

        self.phase = Phase::CleaningUp;
        commands
    }

    fn finish(&mut self, report: CleanupReport) -> Vec<CycleCommand> {
        self.phase = Phase::Done;

        let mut commands = Vec::new();
        if self.watchdog_armed {
            self.watchdog_armed = false;
            commands.push(CycleCommand::DisarmWatchdog);
        }

        let summary = if report.all_succeeded() {
            "shutdown complete".to_string()
        } else {
            format!(
                "shutdown complete ({} of {} cleanup callbacks failed)",
                report.failed, report.total
            )
        };
        commands.push(CycleCommand::Log(LogLevel::Info, summary));

        if self.severity == FailureSeverity::Fatal && !report.all_succeeded() {
            commands.push(CycleCommand::Terminate(FORCED_EXIT_CODE));
        }
        commands
    }
}
