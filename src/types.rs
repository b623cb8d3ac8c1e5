use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::errors::GracefulError;

/// Operating-system signals that can act as a termination trigger.
///
/// Names are accepted with or without the `SIG` prefix and in any case
/// (`"INT"`, `"sigterm"`, `"Hup"`), plus the long forms (`"interrupt"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum SignalName {
    Interrupt,
    Terminate,
    Hangup,
    Quit,
    User1,
    User2,
    Io,
    Alarm,
    Pipe,
    WindowChange,
}

impl SignalName {
    /// Signals listened to when nothing else is configured.
    pub const DEFAULT_SET: [SignalName; 2] = [SignalName::Interrupt, SignalName::Terminate];

    /// Conventional `SIG*` spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalName::Interrupt => "SIGINT",
            SignalName::Terminate => "SIGTERM",
            SignalName::Hangup => "SIGHUP",
            SignalName::Quit => "SIGQUIT",
            SignalName::User1 => "SIGUSR1",
            SignalName::User2 => "SIGUSR2",
            SignalName::Io => "SIGIO",
            SignalName::Alarm => "SIGALRM",
            SignalName::Pipe => "SIGPIPE",
            SignalName::WindowChange => "SIGWINCH",
        }
    }
}

impl fmt::Display for SignalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalName {
    type Err = GracefulError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix("SIG").unwrap_or(&upper);
        match bare {
            "INT" | "INTERRUPT" => Ok(SignalName::Interrupt),
            "TERM" | "TERMINATE" => Ok(SignalName::Terminate),
            "HUP" | "HANGUP" => Ok(SignalName::Hangup),
            "QUIT" => Ok(SignalName::Quit),
            "USR1" | "USER1" => Ok(SignalName::User1),
            "USR2" | "USER2" => Ok(SignalName::User2),
            "IO" | "POLL" => Ok(SignalName::Io),
            "ALRM" | "ALARM" => Ok(SignalName::Alarm),
            "PIPE" => Ok(SignalName::Pipe),
            "WINCH" | "WINDOWCHANGE" => Ok(SignalName::WindowChange),
            _ => Err(GracefulError::InvalidSignal(s.trim().to_string())),
        }
    }
}

impl TryFrom<String> for SignalName {
    type Error = GracefulError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// How a failing cleanup callback is reported.
///
/// - `Warn` (default): log the failure and keep going.
/// - `Fatal`: log at fatal level and terminate the process once every
///   callback has returned, so siblings still get to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureSeverity {
    #[default]
    Warn,
    Fatal,
}

impl FromStr for FailureSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "warn" => Ok(FailureSeverity::Warn),
            "fatal" => Ok(FailureSeverity::Fatal),
            other => Err(format!(
                "invalid failure severity: {other} (expected \"warn\" or \"fatal\")"
            )),
        }
    }
}
