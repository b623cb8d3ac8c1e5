//! Fake services with a `close` operation to register as cleanup callbacks.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use graceful::{closable, Closable};

/// A service that records whether (and how often) it was closed.
#[derive(Debug, Default)]
pub struct TestService {
    closed: AtomicBool,
    calls: AtomicUsize,
    delay: Option<Duration>,
    fail: bool,
}

impl TestService {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Close: count the call, optionally sleep, then succeed or fail.
    ///
    /// A failing service still counts as closed; the failure is what gets
    /// reported.
    pub async fn close(&self) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.closed.store(true, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("service refused to close");
        }
        Ok(())
    }

    /// This service's `close` as a cleanup callback.
    pub fn closable(self: &Arc<Self>) -> Closable {
        let svc = Arc::clone(self);
        closable(move || {
            let svc = Arc::clone(&svc);
            async move { svc.close().await }
        })
    }
}

/// Builder for `TestService`.
#[derive(Debug, Default)]
pub struct ServiceBuilder {
    delay: Option<Duration>,
    fail: bool,
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn build(self) -> Arc<TestService> {
        Arc::new(TestService {
            delay: self.delay,
            fail: self.fail,
            ..TestService::default()
        })
    }
}
