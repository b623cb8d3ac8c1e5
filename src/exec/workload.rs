// src/exec/workload.rs

//! Primary-task runner.

use std::any::Any;
use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How the primary workload ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkloadExit {
    /// The workload future ran to completion.
    Returned,
    /// The workload panicked; the payload message is kept for logging.
    Panicked(String),
    /// The token was already cancelled when the runner started, so the
    /// workload body never ran.
    Skipped,
    /// The task was aborted from outside.
    Aborted,
}

/// Completion handle for a spawned workload.
#[derive(Debug)]
pub struct WorkloadHandle {
    join: Option<JoinHandle<bool>>,
}

impl WorkloadHandle {
    /// Resolves exactly once with the workload's exit.
    ///
    /// Without a workload this never resolves: the cycle then only ends
    /// through a termination event. Dropping the returned future detaches
    /// the workload, which keeps running in the background.
    pub async fn finished(self) -> WorkloadExit {
        let Some(join) = self.join else {
            return std::future::pending().await;
        };

        match join.await {
            Ok(true) => WorkloadExit::Returned,
            Ok(false) => WorkloadExit::Skipped,
            Err(e) if e.is_panic() => WorkloadExit::Panicked(panic_message(e.into_panic())),
            Err(_) => WorkloadExit::Aborted,
        }
    }
}

/// Spawn `workload` on its own Tokio task.
///
/// The token is checked once when the task starts; if it is already
/// cancelled the workload is dropped without being polled. The runner never
/// observes the token after that.
pub fn spawn_workload<F>(workload: Option<F>, token: CancellationToken) -> WorkloadHandle
where
    F: Future<Output = ()> + Send + 'static,
{
    let Some(workload) = workload else {
        debug!("no primary workload; waiting for termination only");
        return WorkloadHandle { join: None };
    };

    let join = tokio::spawn(async move {
        if token.is_cancelled() {
            debug!("token cancelled before the workload started; skipping it");
            return false;
        }
        workload.await;
        true
    });

    WorkloadHandle { join: Some(join) }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn returned_workload_reports_returned() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let handle = spawn_workload(
            Some(async move { flag.store(true, Ordering::SeqCst) }),
            CancellationToken::new(),
        );
        assert_eq!(handle.finished().await, WorkloadExit::Returned);
        assert!(ran.load(Ordering::SeqCst));
    }

    async fn explode() {
        panic!("workload blew up");
    }

    #[tokio::test]
    async fn panicking_workload_still_completes() {
        let handle = spawn_workload(Some(explode()), CancellationToken::new());
        assert_eq!(
            handle.finished().await,
            WorkloadExit::Panicked("workload blew up".to_string())
        );
    }

    #[tokio::test]
    async fn pre_cancelled_token_skips_the_body() {
        let token = CancellationToken::new();
        token.cancel();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let handle = spawn_workload(Some(async move { flag.store(true, Ordering::SeqCst) }), token);
        assert_eq!(handle.finished().await, WorkloadExit::Skipped);
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn absent_workload_never_finishes() {
        let handle = spawn_workload(None::<std::future::Ready<()>>, CancellationToken::new());
        let res = tokio::time::timeout(Duration::from_millis(20), handle.finished()).await;
        assert!(res.is_err());
    }
}
