// src/lib.rs

//! Graceful process shutdown.
//!
//! A [`Shutdown`] runs a primary workload until it finishes or a
//! termination request arrives (an OS signal from the configured set, or
//! cancellation of the configured [`CancellationToken`]). On termination it
//! runs every registered cleanup callback concurrently, and a watchdog
//! forces the process down if cleanup overruns its timeout.

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod host;
pub mod logging;
pub mod shutdown;
pub mod signal;
pub mod types;

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{EffectiveConfig, ShutdownFile, load_and_validate};
use crate::exec::command::{
    CHILD_GRACE, ChildGroups, KillChildrenExit, command_closable, command_workload,
};
use crate::host::FORCED_EXIT_CODE;

pub use crate::config::ShutdownOptions;
pub use crate::engine::CycleOutcome;
pub use crate::exec::{CleanupReport, Closable, WorkloadExit, closable};
pub use crate::host::{LogSink, ProcessExit, Terminator, TracingSink};
pub use crate::shutdown::{DEFAULT_EXPIRATION, Shutdown};
pub use crate::signal::TerminationCause;
pub use crate::types::{FailureSeverity, SignalName};
pub use tokio_util::sync::CancellationToken;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config file + CLI flag resolution
/// - the `--on-shutdown` commands as cleanup callbacks
/// - the `--deadline` timer as the cancellation source
/// - the wrapped command as the primary workload
/// - stopping every child process group before returning, or before the
///   watchdog exits the process
///
/// Returns the process exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    let file = match args.config {
        Some(ref path) => Some(
            load_and_validate(path).with_context(|| format!("loading config file {path:?}"))?,
        ),
        None => None,
    };

    let token = CancellationToken::new();
    let children = ChildGroups::new();
    let options = options_from_args(&args, file.as_ref())
        .token(token.clone())
        .terminator(Arc::new(KillChildrenExit::new(children.clone())));

    if args.dry_run {
        print_dry_run(&args, &options.resolve());
        return Ok(0);
    }

    let shutdown = Shutdown::new(options).register_all(
        args.on_shutdown
            .iter()
            .map(|cmd| command_closable(cmd.clone(), children.clone())),
    );

    if let Some(deadline) = args.deadline {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            info!(deadline_ms = deadline.as_millis() as u64, "deadline reached; requesting shutdown");
            token.cancel();
        });
    }

    let exit_code = Arc::new(AtomicI32::new(0));
    let workload = (!args.command.is_empty()).then(|| {
        command_workload(args.command.clone(), Arc::clone(&exit_code), children.clone())
    });

    let outcome = shutdown.run_graceful(workload).await;
    debug!(?outcome, "shutdown cycle finished");

    // After a termination request the workload is still running here.
    children.shutdown(CHILD_GRACE).await;

    Ok(exit_code_for(&outcome, exit_code.load(Ordering::SeqCst)))
}

/// Layer the options: built-in CLI default, then config file, then flags.
fn options_from_args(args: &CliArgs, file: Option<&ShutdownFile>) -> ShutdownOptions {
    let mut options = ShutdownOptions::new().timeout(DEFAULT_EXPIRATION);

    if let Some(file) = file {
        options = options.merge_file(file);
    }

    match args.timeout {
        Some(t) if t.is_zero() => options = options.unbounded(),
        Some(t) => options = options.timeout(t),
        None => {}
    }
    if !args.signals.is_empty() {
        options = options.signals(args.signals.iter().copied());
    }
    if let Some(severity) = args.on_callback_failure {
        options = options.failure_severity(severity.into());
    }
    options
}

fn exit_code_for(outcome: &CycleOutcome, workload_code: i32) -> i32 {
    match outcome {
        CycleOutcome::CompletedNormally(WorkloadExit::Returned) => workload_code,
        CycleOutcome::CompletedNormally(_) => 1,
        CycleOutcome::Done { .. } => 0,
        CycleOutcome::ForceTerminated { .. } => FORCED_EXIT_CODE,
    }
}

/// Simple dry-run output: print the effective configuration.
fn print_dry_run(args: &CliArgs, cfg: &EffectiveConfig) {
    println!("graceful dry-run");
    match cfg.timeout() {
        Some(t) => println!("  timeout = {} ms", t.as_millis()),
        None => println!("  timeout = unbounded"),
    }
    let signals: Vec<_> = cfg.signals().iter().map(|s| s.as_str()).collect();
    println!("  signals = {}", signals.join(", "));
    println!("  on_callback_failure = {:?}", cfg.failure_severity());
    if let Some(deadline) = args.deadline {
        println!("  deadline = {} ms", deadline.as_millis());
    }
    println!();

    if args.command.is_empty() {
        println!("command: (none, waiting for termination only)");
    } else {
        println!("command: {}", args.command.join(" "));
    }
    println!("on-shutdown ({}):", args.on_shutdown.len());
    for cmd in args.on_shutdown.iter() {
        println!("  - {cmd}");
    }

    debug!("dry-run complete (no execution)");
}
