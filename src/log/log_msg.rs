use std::fmt;

use crate::log::log_level::LogLevel;

/// Represents a single log message event.
///
/// Carries the severity, the wall-clock timestamp, the origin (target) and
/// the formatted text of one log line.
#[derive(Debug, Clone)]
pub struct LogMsg {
    /// The severity level of the log (e.g., Info, Warning, Error).
    pub level: LogLevel,
    /// Milliseconds since the Unix epoch.
    pub ts_ms: u64,
    /// The actual content or payload of the log message.
    pub text: String,
    /// The target source of the log, typically the static module path.
    pub target: &'static str,
}

impl LogMsg {
    /// Creates a new `LogMsg` instance.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let msg = LogMsg::new(
    ///     LogLevel::Info,
    ///     "Connection established",
    ///     module_path!(),
    ///     1678900000000
    /// );
    /// ```
    pub fn new(level: LogLevel, text: impl Into<String>, target: &'static str, ts_ms: u64) -> Self {
        Self {
            level,
            ts_ms,
            text: text.into(),
            target,
        }
    }
}

impl fmt::Display for LogMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} | {}",
            self.level, self.ts_ms, self.target, self.text
        )
    }
}
