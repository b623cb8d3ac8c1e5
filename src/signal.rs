// src/signal.rs

//! Termination listener.
//!
//! Turns a set of OS signals plus a cancellation token into a single
//! "terminate requested" event. Handlers are installed synchronously in
//! [`TerminationListener::register`], so a signal that lands between
//! registration and the first poll of [`TerminationListener::wait`] is
//! buffered by Tokio and still observed.

use std::future::poll_fn;
use std::io;
use std::task::Poll;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::host::LogSink;
use crate::types::SignalName;

#[cfg(unix)]
type SignalStream = tokio::signal::unix::Signal;
#[cfg(windows)]
type SignalStream = tokio::signal::windows::CtrlC;

/// What ended the running phase of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationCause {
    Signal(SignalName),
    Cancelled,
}

pub struct TerminationListener {
    token: CancellationToken,
    streams: Vec<(SignalName, SignalStream)>,
}

impl TerminationListener {
    /// Install handlers for `signals` and watch `token`.
    ///
    /// A signal whose handler cannot be installed is reported through
    /// `log` and skipped; the remaining signals and the token are still
    /// observed. Must be called from within a Tokio runtime.
    pub fn register(signals: &[SignalName], token: CancellationToken, log: &dyn LogSink) -> Self {
        let mut streams = Vec::with_capacity(signals.len());
        for &name in signals {
            match install(name) {
                Ok(stream) => {
                    debug!(signal = %name, "termination signal handler installed");
                    streams.push((name, stream));
                }
                Err(e) => log.warn(&format!("cannot listen for {name}: {e}")),
            }
        }
        Self { token, streams }
    }

    fn signals(&self) -> impl Iterator<Item = SignalName> + '_ {
        self.streams.iter().map(|(name, _)| *name)
    }

    /// Resolve once, with whichever source fires first.
    ///
    /// Cancellation is checked first so an already-cancelled token wins
    /// over a pending signal.
    pub async fn wait(mut self) -> TerminationCause {
        let streams = &mut self.streams;
        tokio::select! {
            biased;
            _ = self.token.cancelled() => TerminationCause::Cancelled,
            name = next_signal(streams) => TerminationCause::Signal(name),
        }
    }
}

impl std::fmt::Debug for TerminationListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminationListener")
            .field("signals", &self.signals().collect::<Vec<_>>())
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

/// First signal delivered on any stream. Pending forever if there are none.
async fn next_signal(streams: &mut [(SignalName, SignalStream)]) -> SignalName {
    poll_fn(|cx| {
        for (name, stream) in streams.iter_mut() {
            if let Poll::Ready(Some(())) = stream.poll_recv(cx) {
                return Poll::Ready(*name);
            }
        }
        Poll::Pending
    })
    .await
}

#[cfg(unix)]
fn install(name: SignalName) -> io::Result<SignalStream> {
    use tokio::signal::unix::{SignalKind, signal};

    let kind = match name {
        SignalName::Interrupt => SignalKind::interrupt(),
        SignalName::Terminate => SignalKind::terminate(),
        SignalName::Hangup => SignalKind::hangup(),
        SignalName::Quit => SignalKind::quit(),
        SignalName::User1 => SignalKind::user_defined1(),
        SignalName::User2 => SignalKind::user_defined2(),
        SignalName::Io => SignalKind::io(),
        SignalName::Alarm => SignalKind::alarm(),
        SignalName::Pipe => SignalKind::pipe(),
        SignalName::WindowChange => SignalKind::window_change(),
    };
    signal(kind)
}

#[cfg(windows)]
fn install(name: SignalName) -> io::Result<SignalStream> {
    match name {
        SignalName::Interrupt => tokio::signal::windows::ctrl_c(),
        other => Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("{other} is not available on this platform"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::TracingSink;
    use std::time::Duration;

    #[tokio::test]
    async fn cancelled_token_fires_without_any_signal() {
        let token = CancellationToken::new();
        let listener = TerminationListener::register(&[SignalName::User2], token.clone(), &TracingSink);
        token.cancel();
        assert_eq!(listener.wait().await, TerminationCause::Cancelled);
    }

    #[tokio::test]
    async fn does_not_fire_while_nothing_happens() {
        let token = CancellationToken::new();
        let listener = TerminationListener::register(&[SignalName::User2], token, &TracingSink);
        let res = tokio::time::timeout(Duration::from_millis(30), listener.wait()).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn cancelling_a_parent_token_fires_child_listener() {
        let parent = CancellationToken::new();
        let listener =
            TerminationListener::register(&[SignalName::User2], parent.child_token(), &TracingSink);
        let waiter = tokio::spawn(listener.wait());
        tokio::time::sleep(Duration::from_millis(10)).await;
        parent.cancel();
        assert_eq!(waiter.await.unwrap(), TerminationCause::Cancelled);
    }
}
