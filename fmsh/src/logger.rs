//! Command journal
//!
//! Commands report what they do through a [`Logger`]. The shell binary
//! installs [`TracingLogger`], which hands every message to `tracing`; the
//! subscriber configured in `main` appends them, timestamped, to the log
//! file. [`MemoryLogger`] keeps messages in memory for inspection.

use std::sync::Mutex;

/// Target used for every journal event.
pub const JOURNAL_TARGET: &str = "fmsh::journal";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalLevel {
    Command,
    Success,
    Warning,
    Error,
}

/// Sink for leveled journal messages.
pub trait Logger {
    fn command(&self, text: &str);
    fn success(&self, text: &str);
    fn warning(&self, text: &str);
    fn error(&self, text: &str);
}

/// Forwards journal messages to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn command(&self, text: &str) {
        tracing::info!(target: JOURNAL_TARGET, kind = "command", "{text}");
    }

    fn success(&self, text: &str) {
        tracing::info!(target: JOURNAL_TARGET, kind = "success", "{text}");
    }

    fn warning(&self, text: &str) {
        tracing::warn!(target: JOURNAL_TARGET, "{text}");
    }

    fn error(&self, text: &str) {
        tracing::error!(target: JOURNAL_TARGET, "{text}");
    }
}

/// Records journal messages in order.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<(JournalLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(JournalLevel, String)> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Messages logged at `level`, oldest first.
    pub fn messages(&self, level: JournalLevel) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    fn push(&self, level: JournalLevel, text: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.push((level, text.to_string()));
        }
    }
}

impl Logger for MemoryLogger {
    fn command(&self, text: &str) {
        self.push(JournalLevel::Command, text);
    }

    fn success(&self, text: &str) {
        self.push(JournalLevel::Success, text);
    }

    fn warning(&self, text: &str) {
        self.push(JournalLevel::Warning, text);
    }

    fn error(&self, text: &str) {
        self.push(JournalLevel::Error, text);
    }
}
