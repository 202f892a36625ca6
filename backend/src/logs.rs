//! Run log.
//!
//! Pipeline steps report progress into a [`RunLog`]. Every entry is also
//! emitted as a `tracing` event at the matching level, so the binary's
//! subscriber shows it live while the log itself travels with the result.

use serde::{Deserialize, Serialize};

/// Log level of a run log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into() }
    }
}

/// Ordered log of one pipeline run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunLog {
    entries: Vec<LogEntry>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry and forward it to `tracing`.
    pub fn log(&mut self, entry: LogEntry) {
        match entry.level {
            LogLevel::Info => tracing::info!("{}", entry.message),
            LogLevel::Success => tracing::info!(status = "ok", "{}", entry.message),
            LogLevel::Warning => tracing::warn!("{}", entry.message),
            LogLevel::Error => tracing::error!("{}", entry.message),
        }
        self.entries.push(entry);
    }

    pub fn info(&mut self, msg: impl Into<String>) {
        self.log(LogEntry::info(msg));
    }

    pub fn success(&mut self, msg: impl Into<String>) {
        self.log(LogEntry::success(msg));
    }

    pub fn warning(&mut self, msg: impl Into<String>) {
        self.log(LogEntry::warning(msg));
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.log(LogEntry::error(msg));
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries at warning level.
    pub fn warnings(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(|e| e.level == LogLevel::Warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_kept_in_order() {
        let mut log = RunLog::new();
        log.info("loading");
        log.warning("sheet skipped");
        log.success("done");

        let levels: Vec<LogLevel> = log.entries().iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![LogLevel::Info, LogLevel::Warning, LogLevel::Success]);
        assert_eq!(log.warnings().count(), 1);
    }

    #[test]
    fn test_entry_serialization() {
        let json = serde_json::to_value(LogEntry::warning("x")).unwrap();
        assert_eq!(json["level"], "warning");
        assert_eq!(json["message"], "x");
    }
}
