//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber the default sink writes to
//! - Pick the output format from config
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level when set
//! - JSON format for production, pretty format for development
//! - Installing twice is an error, not a silent no-op

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::{LogFormat, ObservabilityConfig};
use crate::error::AutoLogError;

/// Build the level filter: `RUST_LOG` if set, the configured level otherwise.
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Install the global subscriber.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), AutoLogError> {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    let result = match config.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    };

    result.map_err(|e| AutoLogError::Logging(e.to_string()))
}
