//! Pipeline progress logging.
//!
//! Every log entry is printed to stderr and broadcast on a channel so that
//! an embedding application can follow a run (see [`LogBroadcaster::subscribe`]).
//! Stage transitions carry a structured [`StageNotice`] with row and column
//! counts before and after the stage.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    fn label(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extract,
    Exclude,
    Normalize,
    Impute,
    Scale,
    Encode,
    Assemble,
    Load,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extract => "extract",
            Stage::Exclude => "exclude",
            Stage::Normalize => "normalize",
            Stage::Impute => "impute",
            Stage::Scale => "scale",
            Stage::Encode => "encode",
            Stage::Assemble => "assemble",
            Stage::Load => "load",
        };
        f.write_str(name)
    }
}

/// Shape of the table before and after a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageNotice {
    pub stage: Stage,
    pub rows_in: usize,
    pub columns_in: usize,
    pub rows_out: usize,
    pub columns_out: usize,
}

impl fmt::Display for StageNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] rows {} -> {}, columns {} -> {}",
            self.stage, self.rows_in, self.rows_out, self.columns_in, self.columns_out
        )
    }
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Optional indentation level (for nested logs)
    #[serde(default)]
    pub indent: u8,
    /// When the entry was created
    pub timestamp: DateTime<Utc>,
    /// Set on stage transition entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageNotice>,
}

impl LogEntry {
    fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            indent: 0,
            timestamp: Utc::now(),
            stage: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    pub fn stage(notice: StageNotice) -> Self {
        let mut entry = Self::new(LogLevel::Info, notice.to_string());
        entry.stage = Some(notice);
        entry
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// `2026-10-18 09:12:44 - INFO - message`
    pub fn render(&self) -> String {
        format!(
            "{} - {} - {}{}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level.label(),
            "   ".repeat(self.indent as usize),
            self.message
        )
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Prints log entries and broadcasts them to subscribers
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Print the entry to stderr and send it to all subscribers
    pub fn log(&self, entry: LogEntry) {
        eprintln!("{}", entry.render());

        // No receivers is the normal CLI case
        let _ = self.sender.send(entry);
    }

    /// Get a receiver for every entry logged from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenient logging functions
pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::error(msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::info(msg).with_indent(indent));
}

/// Emit a stage transition notice and return it for the run report
pub fn log_stage(
    stage: Stage,
    (rows_in, columns_in): (usize, usize),
    (rows_out, columns_out): (usize, usize),
) -> StageNotice {
    let notice = StageNotice {
        stage,
        rows_in,
        columns_in,
        rows_out,
        columns_out,
    };
    LOG_BROADCASTER.log(LogEntry::stage(notice.clone()));
    notice
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_format() {
        let entry = LogEntry::warning("degenerate column: scaling skipped").with_indent(1);
        let line = entry.render();
        assert!(line.contains(" - WARNING - "));
        assert!(line.ends_with("   degenerate column: scaling skipped"));
    }

    #[test]
    fn test_stage_notice_display() {
        let notice = StageNotice {
            stage: Stage::Encode,
            rows_in: 3,
            columns_in: 2,
            rows_out: 3,
            columns_out: 4,
        };
        assert_eq!(notice.to_string(), "[encode] rows 3 -> 3, columns 2 -> 4");
    }

    #[test]
    fn test_subscriber_receives_entries() {
        let broadcaster = LogBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        broadcaster.log(LogEntry::info("hello"));
        broadcaster.log(LogEntry::stage(StageNotice {
            stage: Stage::Extract,
            rows_in: 0,
            columns_in: 0,
            rows_out: 5,
            columns_out: 13,
        }));

        let first = rx.try_recv().unwrap();
        assert_eq!(first.message, "hello");
        assert!(first.stage.is_none());

        let second = rx.try_recv().unwrap();
        assert_eq!(second.stage.unwrap().columns_out, 13);
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let entry = LogEntry::stage(StageNotice {
            stage: Stage::Load,
            rows_in: 1,
            columns_in: 1,
            rows_out: 1,
            columns_out: 1,
        });
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["level"], "info");
        assert_eq!(json["stage"]["stage"], "load");
        assert_eq!(json["stage"]["rowsOut"], 1);
    }
}
