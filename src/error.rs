//! Error types for interception and bootstrapping.

use thiserror::Error;

use crate::config::loader::ConfigError;

/// A method could not be found in its component's method table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no method `{method}({})` on component `{component}`", .parameter_types.join(", "))]
pub struct MethodNotFound {
    /// Path of the component that was searched.
    pub component: &'static str,
    /// Name from the invoked signature.
    pub method: &'static str,
    /// Declared parameter types from the invoked signature.
    pub parameter_types: &'static [&'static str],
}

/// Errors raised by the aspect itself, never by the intercepted method.
#[derive(Debug, Error)]
pub enum AutoLogError {
    /// Signature mismatch between the join point and the target's table.
    #[error("failed to resolve intercepted method")]
    Resolution(#[source] MethodNotFound),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The tracing subscriber could not be installed.
    #[error("logging init failed: {0}")]
    Logging(String),
}

impl From<MethodNotFound> for AutoLogError {
    fn from(err: MethodNotFound) -> Self {
        AutoLogError::Resolution(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_resolution_error_chains_source() {
        let err = AutoLogError::from(MethodNotFound {
            component: "shop::Cart",
            method: "add",
            parameter_types: &["u32", "& str"],
        });
        assert_eq!(err.to_string(), "failed to resolve intercepted method");
        let source = err.source().map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("no method `add(u32, & str)` on component `shop::Cart`")
        );
    }
}
