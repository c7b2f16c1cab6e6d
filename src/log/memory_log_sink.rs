use std::sync::Mutex;

use crate::log::{log_level::LogLevel, log_msg::LogMsg, log_sink::LogSink};
use crate::utils::now_millis;

/// Keeps every line in memory. Meant for tests and for embedders that want
/// to surface recent log lines themselves.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<LogMsg>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every recorded line, oldest first.
    pub fn lines(&self) -> Vec<LogMsg> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// True if any line at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.lines
            .lock()
            .map(|l| l.iter().any(|m| m.level == level && m.text.contains(needle)))
            .unwrap_or(false)
    }
}

impl LogSink for MemoryLogSink {
    fn log(&self, level: LogLevel, msg: &str, target: &'static str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(LogMsg::new(level, msg, target, now_millis()));
        }
    }
}
