// src/exec/cleanup.rs

//! Cleanup dispatcher.
//!
//! Every callback gets its own Tokio task on a [`JoinSet`]; the dispatcher
//! returns once all of them have returned. A failing or panicking callback
//! is logged and counted, never retried, and never stops its siblings.
//! Dropping the dispatch future aborts whatever is still running.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::debug;

use crate::exec::workload::panic_message;
use crate::host::LogSink;
use crate::types::FailureSeverity;

/// Future returned by a cleanup callback.
pub type CleanupFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// A registered cleanup callback.
///
/// Stored behind an `Arc<dyn Fn>` so one registration can be invoked once
/// per cycle.
pub type Closable = Arc<dyn Fn() -> CleanupFuture + Send + Sync>;

/// Wrap an async closure as a [`Closable`].
pub fn closable<F, Fut>(f: F) -> Closable
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()) as CleanupFuture)
}

/// Outcome of one cleanup round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanupReport {
    pub total: usize,
    pub failed: usize,
}

impl CleanupReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Run all `callbacks` concurrently and wait for every one of them.
pub async fn dispatch(
    callbacks: &[Closable],
    log: &Arc<dyn LogSink>,
    severity: FailureSeverity,
) -> CleanupReport {
    let mut set = JoinSet::new();
    for callback in callbacks {
        set.spawn(callback());
    }

    let mut report = CleanupReport {
        total: callbacks.len(),
        failed: 0,
    };

    while let Some(joined) = set.join_next().await {
        let message = match joined {
            Ok(Ok(())) => {
                debug!("cleanup callback finished");
                continue;
            }
            Ok(Err(e)) => format!("service could not be closed: {e:#}"),
            Err(e) if e.is_panic() => {
                format!("cleanup callback panicked: {}", panic_message(e.into_panic()))
            }
            Err(e) => format!("cleanup callback was cancelled: {e}"),
        };

        report.failed += 1;
        match severity {
            FailureSeverity::Warn => log.warn(&message),
            FailureSeverity::Fatal => log.fatal(&message),
        }
    }

    report
}
