// src/exec/watchdog.rs

//! One-shot cleanup watchdog.
//!
//! Arming starts a dedicated OS thread that parks until the timeout
//! elapses. If it wakes up still armed it logs at fatal level, calls the
//! [`Terminator`] and then reports that it fired through a oneshot the
//! orchestrator selects on. The deadline does not depend on the Tokio
//! runtime being able to poll anything, so a callback that blocks its
//! worker (or the only worker of a current-thread runtime) cannot hold the
//! process past the timeout.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::{self, Thread};
use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tracing::debug;

use crate::host::{FORCED_EXIT_CODE, LogSink, Terminator};

const ARMED: u8 = 0;
const DISARMED: u8 = 1;
const FIRED: u8 = 2;

#[derive(Debug)]
pub struct Watchdog {
    state: Arc<AtomicU8>,
    thread: Thread,
    fired_rx: oneshot::Receiver<()>,
}

impl Watchdog {
    /// Start the timer thread. Fails only if the OS refuses a new thread.
    pub fn arm(
        timeout: Duration,
        log: Arc<dyn LogSink>,
        terminator: Arc<dyn Terminator>,
    ) -> io::Result<Self> {
        let (fired_tx, fired_rx) = oneshot::channel();
        let state = Arc::new(AtomicU8::new(ARMED));
        let shared = Arc::clone(&state);

        let handle = thread::Builder::new()
            .name("graceful-watchdog".to_string())
            .spawn(move || {
                if !park_until(Instant::now().checked_add(timeout), &shared) {
                    return;
                }
                // Disarm and fire race on this exchange; exactly one wins.
                if shared
                    .compare_exchange(ARMED, FIRED, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    return;
                }
                log.fatal(&format!(
                    "shutdown timeout of {} ms elapsed, forcing exit",
                    timeout.as_millis()
                ));
                terminator.terminate(FORCED_EXIT_CODE);
                let _ = fired_tx.send(());
            })?;

        debug!(timeout_ms = timeout.as_millis() as u64, "watchdog armed");
        Ok(Self {
            state,
            thread: handle.thread().clone(),
            fired_rx,
        })
    }

    /// Resolves once the watchdog has fired (after the terminator returned).
    /// Never resolves if it is disarmed first.
    pub async fn fired(&mut self) {
        if (&mut self.fired_rx).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Cancel the timer. No-op if it already fired.
    pub fn disarm(self) {
        debug!("watchdog disarmed");
        drop(self);
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        if self
            .state
            .compare_exchange(ARMED, DISARMED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.thread.unpark();
        }
    }
}

/// Park the current thread until `deadline`. Returns `false` as soon as the
/// watchdog is no longer armed. `None` means the deadline is unreachable.
fn park_until(deadline: Option<Instant>, state: &AtomicU8) -> bool {
    loop {
        if state.load(Ordering::Acquire) != ARMED {
            return false;
        }
        match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return true;
                }
                thread::park_timeout(deadline - now);
            }
            None => thread::park(),
        }
    }
}

/// Wait on an optional watchdog; pending forever when there is none.
pub async fn fired(watchdog: &mut Option<Watchdog>) {
    match watchdog {
        Some(w) => w.fired().await,
        None => std::future::pending().await,
    }
}
