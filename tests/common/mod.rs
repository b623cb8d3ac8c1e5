#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use graceful::{CancellationToken, ShutdownOptions, SignalName};
use graceful_test_utils::recording::{RecordingSink, RecordingTerminator};

pub use graceful_test_utils::services::{ServiceBuilder, TestService};
pub use graceful_test_utils::{init_tracing, with_timeout};

/// Everything a cycle test needs to observe the orchestrator.
pub struct Harness {
    pub token: CancellationToken,
    pub sink: Arc<RecordingSink>,
    pub terminator: Arc<RecordingTerminator>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            sink: RecordingSink::new(),
            terminator: RecordingTerminator::new(),
        }
    }

    /// Options wired to this harness. Listens only for SIGUSR2, which no
    /// test sends, so cycles are driven by the token.
    pub fn options(&self) -> ShutdownOptions {
        ShutdownOptions::new()
            .signals([SignalName::User2])
            .token(self.token.clone())
            .log_sink(self.sink.clone())
            .terminator(self.terminator.clone())
    }

    /// Cancel the token after `delay`, from a background task.
    pub fn cancel_after(&self, delay: Duration) {
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            token.cancel();
        });
    }
}
