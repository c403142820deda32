//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AutoLogConfig {
    /// Interception settings.
    pub aspect: AspectConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Which components are intercepted.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AspectConfig {
    /// Master switch; when false annotated methods run without records.
    pub enabled: bool,

    /// Module path prefixes of the components to intercept (empty = all).
    pub base_paths: Vec<String>,

    /// Record invocation counters and durations through `metrics`.
    pub metrics_enabled: bool,
}

impl Default for AspectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_paths: Vec::new(),
            metrics_enabled: false,
        }
    }
}

/// Output format of the `fmt` layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
        }
    }
}
