// src/config/options.rs

//! Option resolution.
//!
//! [`ShutdownOptions`] is a draft: every builder method is a pure
//! `draft -> draft` step, applied in call order. [`ShutdownOptions::resolve`]
//! fills in the defaults for anything left unset and freezes the result
//! into an [`EffectiveConfig`]. Resolution never fails; unusable values
//! (a zero timeout, an empty signal set) fall back silently.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::model::ShutdownFile;
use crate::host::{LogSink, ProcessExit, Terminator, TracingSink};
use crate::types::{FailureSeverity, SignalName};

/// Builder-style draft of the shutdown configuration.
#[derive(Default, Clone)]
pub struct ShutdownOptions {
    timeout: Option<Duration>,
    token: Option<CancellationToken>,
    log: Option<Arc<dyn LogSink>>,
    signals: Option<Vec<SignalName>>,
    terminator: Option<Arc<dyn Terminator>>,
    failure_severity: Option<FailureSeverity>,
}

impl ShutdownOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the cleanup phase. A zero duration is ignored.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.timeout = Some(timeout);
        }
        self
    }

    /// Remove any bound on the cleanup phase set by an earlier step.
    pub fn unbounded(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Parent cancellation token. Cancelling it counts as a termination
    /// request, exactly like a signal.
    pub fn token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = Some(log);
        self
    }

    /// Replace (not extend) the signal set.
    pub fn signals<I>(mut self, signals: I) -> Self
    where
        I: IntoIterator<Item = SignalName>,
    {
        self.signals = Some(signals.into_iter().collect());
        self
    }

    pub fn terminator(mut self, terminator: Arc<dyn Terminator>) -> Self {
        self.terminator = Some(terminator);
        self
    }

    pub fn failure_severity(mut self, severity: FailureSeverity) -> Self {
        self.failure_severity = Some(severity);
        self
    }

    /// Apply the settings of a loaded config file on top of this draft.
    ///
    /// Only values the file actually sets are applied, so a file without a
    /// `timeout` leaves an earlier `timeout(..)` call in place. An explicit
    /// zero timeout in the file removes the bound.
    pub fn merge_file(mut self, file: &ShutdownFile) -> Self {
        match file.timeout {
            Some(timeout) if timeout.is_zero() => self = self.unbounded(),
            Some(timeout) => self = self.timeout(timeout),
            None => {}
        }
        if let Some(ref signals) = file.signals {
            self = self.signals(signals.iter().copied());
        }
        if let Some(severity) = file.on_callback_failure {
            self = self.failure_severity(severity);
        }
        self
    }

    /// Freeze the draft, applying defaults:
    ///
    /// - timeout: unbounded
    /// - signals: `SIGINT`, `SIGTERM`
    /// - token: a fresh token nobody else holds
    /// - log sink: [`TracingSink`]
    /// - terminator: [`ProcessExit`]
    /// - failure severity: [`FailureSeverity::Warn`]
    pub fn resolve(self) -> EffectiveConfig {
        let mut signals = match self.signals {
            Some(signals) if !signals.is_empty() => signals,
            _ => SignalName::DEFAULT_SET.to_vec(),
        };
        let mut seen = Vec::with_capacity(signals.len());
        signals.retain(|s| {
            if seen.contains(s) {
                false
            } else {
                seen.push(*s);
                true
            }
        });

        EffectiveConfig {
            timeout: self.timeout,
            signals,
            token: self.token.unwrap_or_else(CancellationToken::new),
            log: self.log.unwrap_or_else(|| Arc::new(TracingSink)),
            terminator: self.terminator.unwrap_or_else(|| Arc::new(ProcessExit)),
            failure_severity: self.failure_severity.unwrap_or_default(),
        }
    }
}

impl fmt::Debug for ShutdownOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownOptions")
            .field("timeout", &self.timeout)
            .field("signals", &self.signals)
            .field("token", &self.token)
            .field("failure_severity", &self.failure_severity)
            .finish_non_exhaustive()
    }
}

/// Fully resolved, immutable shutdown configuration.
#[derive(Clone)]
pub struct EffectiveConfig {
    pub(crate) timeout: Option<Duration>,
    pub(crate) signals: Vec<SignalName>,
    pub(crate) token: CancellationToken,
    pub(crate) log: Arc<dyn LogSink>,
    pub(crate) terminator: Arc<dyn Terminator>,
    pub(crate) failure_severity: FailureSeverity,
}

impl EffectiveConfig {
    /// `None` means the cleanup phase is unbounded.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Never empty.
    pub fn signals(&self) -> &[SignalName] {
        &self.signals
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn log(&self) -> &Arc<dyn LogSink> {
        &self.log
    }

    pub fn terminator(&self) -> &Arc<dyn Terminator> {
        &self.terminator
    }

    pub fn failure_severity(&self) -> FailureSeverity {
        self.failure_severity
    }
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        ShutdownOptions::new().resolve()
    }
}

impl fmt::Debug for EffectiveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectiveConfig")
            .field("timeout", &self.timeout)
            .field("signals", &self.signals)
            .field("cancelled", &self.token.is_cancelled())
            .field("failure_severity", &self.failure_severity)
            .finish_non_exhaustive()
    }
}
