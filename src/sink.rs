//! Log sinks receiving the interceptor's records.
//!
//! # Responsibilities
//! - Define the leveled sink contract (`info`, `warn`, `error`)
//! - Forward records to `tracing` by default
//! - Capture records in memory for assertions
//!
//! # Design Decisions
//! - Records carry `fmt::Arguments`; nothing is formatted unless the sink
//!   decides to keep the record
//! - Sinks only borrow values, so logging can never alter what the caller gets
//! - Sinks are assumed not to fail

use std::fmt;
use std::sync::Mutex;

/// Which part of an invocation a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Param,
    Result,
    CostTime,
    SlowCall,
    Exception,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Param => "param",
            RecordKind::Result => "result",
            RecordKind::CostTime => "cost_time",
            RecordKind::SlowCall => "slow_call",
            RecordKind::Exception => "exception",
        }
    }
}

/// A single log record emitted for an invocation.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    /// Simple name of the intercepted method.
    pub method: &'a str,
    pub kind: RecordKind,
    pub message: fmt::Arguments<'a>,
}

/// Leveled structured logger that receives records.
pub trait LogSink: Send + Sync {
    fn info(&self, record: &Record<'_>);

    fn warn(&self, record: &Record<'_>);

    /// Error record with the failure attached.
    fn error(&self, record: &Record<'_>, cause: &dyn fmt::Debug);
}

/// Sink forwarding records as `tracing` events under the `auto_log` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn info(&self, record: &Record<'_>) {
        tracing::info!(
            target: "auto_log",
            method = record.method,
            record = record.kind.as_str(),
            "{}",
            record.message
        );
    }

    fn warn(&self, record: &Record<'_>) {
        tracing::warn!(
            target: "auto_log",
            method = record.method,
            record = record.kind.as_str(),
            "{}",
            record.message
        );
    }

    fn error(&self, record: &Record<'_>, cause: &dyn fmt::Debug) {
        tracing::error!(
            target: "auto_log",
            method = record.method,
            record = record.kind.as_str(),
            cause = ?cause,
            "{}",
            record.message
        );
    }
}

/// Severity of a captured record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// A record as stored by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRecord {
    pub level: Level,
    pub method: String,
    pub kind: RecordKind,
    pub message: String,
    /// `Debug` rendering of the attached failure, for error records.
    pub cause: Option<String>,
}

/// In-memory sink that keeps every record in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<CapturedRecord>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records captured so far.
    pub fn records(&self) -> Vec<CapturedRecord> {
        self.lock().clone()
    }

    /// Captured messages with their levels, in order.
    pub fn messages(&self) -> Vec<(Level, String)> {
        self.lock()
            .iter()
            .map(|r| (r.level, r.message.clone()))
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn push(&self, level: Level, record: &Record<'_>, cause: Option<String>) {
        self.lock().push(CapturedRecord {
            level,
            method: record.method.to_string(),
            kind: record.kind,
            message: record.message.to_string(),
            cause,
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<CapturedRecord>> {
        // a panicking test thread must not hide the records from the others
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LogSink for RecordingSink {
    fn info(&self, record: &Record<'_>) {
        self.push(Level::Info, record, None);
    }

    fn warn(&self, record: &Record<'_>) {
        self.push(Level::Warn, record, None);
    }

    fn error(&self, record: &Record<'_>, cause: &dyn fmt::Debug) {
        self.push(Level::Error, record, Some(format!("{:?}", cause)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.info(&Record {
            method: "add",
            kind: RecordKind::Param,
            message: format_args!("{} param is {}.", "add", "[1]"),
        });
        sink.error(
            &Record {
                method: "add",
                kind: RecordKind::Exception,
                message: format_args!("{} meet ex.", "add"),
            },
            &"overflow",
        );

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, Level::Info);
        assert_eq!(records[0].message, "add param is [1].");
        assert_eq!(records[0].cause, None);
        assert_eq!(records[1].level, Level::Error);
        assert_eq!(records[1].kind, RecordKind::Exception);
        assert_eq!(records[1].cause.as_deref(), Some("\"overflow\""));

        sink.clear();
        assert!(sink.records().is_empty());
    }
}
