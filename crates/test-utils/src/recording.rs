//! Host capabilities that record instead of acting.

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use graceful::{LogSink, Terminator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Fatal,
}

/// Log sink that keeps every line, and mirrors it to `tracing`.
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<(Level, String)>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn count(&self, level: Level) -> usize {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .count()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .any(|(l, msg)| *l == level && msg.contains(needle))
    }

    fn push(&self, level: Level, message: &str) {
        tracing::info!(?level, "{message}");
        self.lines.lock().unwrap().push((level, message.to_string()));
    }
}

impl LogSink for RecordingSink {
    fn info(&self, message: &str) {
        self.push(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(Level::Warn, message);
    }

    fn fatal(&self, message: &str) {
        self.push(Level::Fatal, message);
    }
}

/// Terminator that counts calls instead of exiting.
#[derive(Debug, Default)]
pub struct RecordingTerminator {
    calls: AtomicUsize,
    last_code: AtomicI32,
    first_call: Mutex<Option<Instant>>,
}

impl RecordingTerminator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_code(&self) -> i32 {
        self.last_code.load(Ordering::SeqCst)
    }

    /// When `terminate` was first called, if ever.
    pub fn first_call_at(&self) -> Option<Instant> {
        *self.first_call.lock().unwrap()
    }
}

impl Terminator for RecordingTerminator {
    fn terminate(&self, code: i32) {
        self.first_call
            .lock()
            .unwrap()
            .get_or_insert_with(Instant::now);
        self.last_code.store(code, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}
