// src/engine/runtime.rs

use std::fmt;
use std::future::Future;

use tracing::{debug, info};

use crate::config::EffectiveConfig;
use crate::exec::watchdog::{self, Watchdog};
use crate::exec::{Closable, dispatch, spawn_workload};
use crate::signal::{TerminationCause, TerminationListener};

use super::core::CycleCore;
use super::{CycleCommand, CycleEvent, CycleOutcome, LogLevel, Phase};

/// Drives one shutdown cycle.
///
/// This is the async IO shell around [`CycleCore`], which holds all the
/// cycle semantics. This struct spawns the workload, listens for
/// termination, owns the watchdog and awaits the cleanup round, feeding
/// whatever happens first back into the core.
pub struct CycleRuntime<'a> {
    core: CycleCore,
    config: &'a EffectiveConfig,
    callbacks: &'a [Closable],
    watchdog: Option<Watchdog>,
}

impl fmt::Debug for CycleRuntime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CycleRuntime")
            .field("core", &self.core)
            .field("callbacks", &self.callbacks.len())
            .field("watchdog", &self.watchdog)
            .finish_non_exhaustive()
    }
}

impl<'a> CycleRuntime<'a> {
    pub fn new(config: &'a EffectiveConfig, callbacks: &'a [Closable]) -> Self {
        Self {
            core: CycleCore::new(config.timeout(), config.failure_severity()),
            config,
            callbacks,
            watchdog: None,
        }
    }

    /// Run the cycle to completion.
    ///
    /// - Registers the listener, then spawns the workload.
    /// - Waits for whichever finishes first; termination wins ties.
    /// - On termination, executes the core's commands (watchdog armed
    ///   first), then waits for the cleanup round or the watchdog,
    ///   whichever comes first. A watchdog that has already fired wins.
    pub async fn run<F>(mut self, workload: Option<F>) -> CycleOutcome
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let config = self.config;
        let callbacks = self.callbacks;

        let step = self.core.step(CycleEvent::Started);
        debug_assert_eq!(
            step.commands,
            [CycleCommand::Listen, CycleCommand::SpawnWorkload]
        );
        debug!(phase = ?step.phase, "shutdown cycle started");

        let listener = TerminationListener::register(
            config.signals(),
            config.token().clone(),
            config.log().as_ref(),
        );
        let handle = spawn_workload(workload, config.token().clone());

        let event = tokio::select! {
            biased;
            cause = listener.wait() => CycleEvent::TerminationRequested(cause),
            exit = handle.finished() => CycleEvent::WorkloadFinished(exit),
        };

        let step = self.core.step(event.clone());
        self.execute_all(step.commands);

        if let (Phase::CompletedNormally, CycleEvent::WorkloadFinished(exit)) = (step.phase, event) {
            debug!(?exit, "primary workload finished before any termination request");
            return CycleOutcome::CompletedNormally(exit);
        }

        let cause = self.core.cause().unwrap_or(TerminationCause::Cancelled);

        // The watchdog fires from its own thread even while a callback
        // blocks this one, so once both are ready it must win.
        let event = tokio::select! {
            biased;
            _ = watchdog::fired(&mut self.watchdog) => CycleEvent::WatchdogFired,
            report = dispatch(callbacks, config.log(), config.failure_severity()) => {
                CycleEvent::CleanupFinished(report)
            }
        };

        let step = self.core.step(event.clone());
        self.execute_all(step.commands);

        match event {
            CycleEvent::CleanupFinished(report) => CycleOutcome::Done { cause, report },
            _ => CycleOutcome::ForceTerminated { cause },
        }
    }

    fn execute_all(&mut self, commands: Vec<CycleCommand>) {
        for command in commands {
            self.execute(command);
        }
    }

    /// Execute a single command from the core.
    fn execute(&mut self, command: CycleCommand) {
        let config = self.config;
        let log = config.log();
        match command {
            CycleCommand::Log(LogLevel::Info, msg) => log.info(&msg),
            CycleCommand::Log(LogLevel::Warn, msg) => log.warn(&msg),
            CycleCommand::Log(LogLevel::Fatal, msg) => log.fatal(&msg),
            CycleCommand::ArmWatchdog(timeout) => {
                match Watchdog::arm(timeout, log.clone(), config.terminator().clone()) {
                    Ok(dog) => self.watchdog = Some(dog),
                    Err(e) => log.warn(&format!(
                        "cannot start the shutdown watchdog ({e}); cleanup is unbounded"
                    )),
                }
            }
            CycleCommand::DispatchCleanup => {
                info!(callbacks = self.callbacks.len(), "dispatching cleanup callbacks");
            }
            CycleCommand::DisarmWatchdog => {
                if let Some(dog) = self.watchdog.take() {
                    dog.disarm();
                }
            }
            CycleCommand::AbandonCleanup => {
                debug!("watchdog fired; remaining cleanup callbacks abandoned");
                self.watchdog = None;
            }
            CycleCommand::Terminate(code) => config.terminator().terminate(code),
            CycleCommand::Listen | CycleCommand::SpawnWorkload => {
                debug!(?command, "command only valid when the cycle starts; ignoring");
            }
        }
    }
}
