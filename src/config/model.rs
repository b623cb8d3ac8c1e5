// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::types::{FailureSeverity, SignalName};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [shutdown]
/// timeout = "5s"
/// signals = ["INT", "TERM"]
/// on_callback_failure = "warn"
/// ```
///
/// Every key is optional; anything left out falls back to the builder's
/// defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawShutdownFile {
    #[serde(default)]
    pub shutdown: RawShutdownSection,
}

/// `[shutdown]` section, before duration strings are parsed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawShutdownSection {
    /// Duration string (e.g. `"10s"`) bounding the cleanup phase.
    /// `"0s"` leaves the cleanup phase unbounded.
    pub timeout: Option<String>,

    /// Signals that trigger shutdown. Replaces the default set.
    pub signals: Option<Vec<SignalName>>,

    /// `"warn"` (default) or `"fatal"`.
    pub on_callback_failure: Option<FailureSeverity>,
}

/// Validated file settings, ready to merge into
/// [`ShutdownOptions`](crate::config::ShutdownOptions).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownFile {
    /// `None` when unset; `Some(Duration::ZERO)` explicitly removes the bound.
    pub timeout: Option<Duration>,
    pub signals: Option<Vec<SignalName>>,
    pub on_callback_failure: Option<FailureSeverity>,
}
