//! The `AutoLog` option set.
//!
//! # Responsibilities
//! - Carry the five logging options attached to a method
//! - Provide the documented defaults
//!
//! # Design Decisions
//! - `Copy` and `const`-constructible so `#[auto_log(...)]` can bake the
//!   options into a constant that survives into the running program
//! - No behavior; the interceptor reads it once per invocation

/// Logging options attached to an intercepted method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AutoLog {
    /// Log the argument list before the call.
    pub param: bool,

    /// Log the return value after a successful call.
    pub result: bool,

    /// Log the elapsed milliseconds after a successful call.
    pub cost_time: bool,

    /// Warn when elapsed milliseconds reach this value. Negative disables.
    pub slow_threshold_mills: i64,

    /// Log failures before re-raising them.
    pub exception: bool,
}

impl AutoLog {
    /// Options with every default applied.
    pub const DEFAULT: AutoLog = AutoLog::new();

    pub const fn new() -> Self {
        Self {
            param: true,
            result: true,
            cost_time: true,
            slow_threshold_mills: -1,
            exception: true,
        }
    }

    pub const fn param(mut self, param: bool) -> Self {
        self.param = param;
        self
    }

    pub const fn result(mut self, result: bool) -> Self {
        self.result = result;
        self
    }

    pub const fn cost_time(mut self, cost_time: bool) -> Self {
        self.cost_time = cost_time;
        self
    }

    pub const fn slow_threshold_mills(mut self, threshold: i64) -> Self {
        self.slow_threshold_mills = threshold;
        self
    }

    pub const fn exception(mut self, exception: bool) -> Self {
        self.exception = exception;
        self
    }

    /// True when slow-call warnings are active (threshold >= 0).
    pub const fn slow_log_enabled(&self) -> bool {
        self.slow_threshold_mills >= 0
    }

    /// True when the end instant has to be read after a successful call.
    pub const fn needs_timing(&self) -> bool {
        self.cost_time || self.slow_log_enabled()
    }

    /// Returns true if `elapsed_ms` meets the slow threshold.
    pub fn is_slow(&self, elapsed_ms: u64) -> bool {
        // threshold is non-negative inside this branch, so the cast is lossless
        self.slow_log_enabled() && elapsed_ms >= self.slow_threshold_mills as u64
    }
}

impl Default for AutoLog {
    fn default() -> Self {
        Self::new()
    }
}
