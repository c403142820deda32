//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AutoLogConfig (validated, immutable)
//!     → aspect scope + logging subscriber
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → AutoLogAspect::reconfigure swaps the pointcut atomically
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an empty file is a valid config
//! - Validation separates syntactic (serde) from semantic checks
//! - Only the aspect section is hot-reloadable; the subscriber is set once

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{AspectConfig, AutoLogConfig, LogFormat, ObservabilityConfig};
