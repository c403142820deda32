//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the log level is one the subscriber understands
//! - Check base paths are `::`-separated Rust identifier paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AutoLogConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::AutoLogConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// A single semantic problem in a config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown log level `{0}`")]
    UnknownLogLevel(String),

    #[error("aspect.base_paths[{index}] is empty")]
    EmptyBasePath { index: usize },

    #[error("aspect.base_paths[{index}] `{path}` is not a module path")]
    InvalidBasePath { index: usize, path: String },
}

/// Validate a parsed config, collecting every error.
pub fn validate_config(config: &AutoLogConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    for (index, path) in config.aspect.base_paths.iter().enumerate() {
        if path.trim().is_empty() {
            errors.push(ValidationError::EmptyBasePath { index });
        } else if !is_module_path(path) {
            errors.push(ValidationError::InvalidBasePath {
                index,
                path: path.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_module_path(path: &str) -> bool {
    path.split("::").all(is_identifier)
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => chars.all(|c| c == '_' || c.is_alphanumeric()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&AutoLogConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AutoLogConfig::default();
        config.observability.log_level = "loud".into();
        config.aspect.base_paths = vec![
            "shop::service".into(),
            " ".into(),
            "shop::".into(),
            "9lives".into(),
        ];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::UnknownLogLevel("loud".into()),
                ValidationError::EmptyBasePath { index: 1 },
                ValidationError::InvalidBasePath { index: 2, path: "shop::".into() },
                ValidationError::InvalidBasePath { index: 3, path: "9lives".into() },
            ]
        );
    }

    #[test]
    fn test_log_level_case_insensitive() {
        let mut config = AutoLogConfig::default();
        config.observability.log_level = "WARN".into();
        assert!(validate_config(&config).is_ok());
    }
}
