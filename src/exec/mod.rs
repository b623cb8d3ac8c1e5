// src/exec/mod.rs

//! Execution layer of a shutdown cycle.
//!
//! - [`workload`] runs the primary workload on its own Tokio task and
//!   reports when it is finished.
//! - [`cleanup`] runs every registered cleanup callback concurrently and
//!   waits for all of them.
//! - [`watchdog`] is the one-shot timer that forces termination when the
//!   cleanup phase overruns its timeout.
//! - [`command`] adapts shell commands into workloads and cleanup
//!   callbacks for the `graceful` binary.

pub mod cleanup;
pub mod command;
pub mod watchdog;
pub mod workload;

pub use cleanup::{CleanupFuture, CleanupReport, Closable, closable, dispatch};
pub use watchdog::Watchdog;
pub use workload::{WorkloadExit, WorkloadHandle, spawn_workload};
