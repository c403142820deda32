//! Metrics collection.
//!
//! # Metrics
//! - `auto_log_invocations_total` (counter): intercepted calls by method, outcome
//! - `auto_log_slow_calls_total` (counter): slow records by method
//! - `auto_log_call_duration_ms` (histogram): measured elapsed time by method
//!
//! # Design Decisions
//! - Goes through the `metrics` facade; the host installs the recorder
//! - Durations are only recorded when the invocation measured them

/// How an intercepted call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

pub fn record_invocation(method: &'static str, outcome: Outcome) {
    ::metrics::counter!(
        "auto_log_invocations_total",
        "method" => method,
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

pub fn record_slow_call(method: &'static str) {
    ::metrics::counter!("auto_log_slow_calls_total", "method" => method).increment(1);
}

pub fn record_duration(method: &'static str, elapsed_ms: u64) {
    ::metrics::histogram!("auto_log_call_duration_ms", "method" => method).record(elapsed_ms as f64);
}
