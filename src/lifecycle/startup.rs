//! Startup orchestration.

use std::path::Path;
use std::sync::Arc;

use crate::aspect::{self, AutoLogAspect};
use crate::config::loader::load_config;
use crate::error::AutoLogError;
use crate::observability::logging::init_logging;
use crate::sink::TracingSink;

/// Load the config at `path`, install the subscriber and enable a
/// [`TracingSink`]-backed aspect for the whole process.
pub fn bootstrap(path: &Path) -> Result<Arc<AutoLogAspect>, AutoLogError> {
    let config = load_config(path)?;

    init_logging(&config.observability)?;

    let aspect = Arc::new(AutoLogAspect::from_config(
        &config.aspect,
        Arc::new(TracingSink),
    ));
    aspect::enable(aspect.clone());

    tracing::info!(
        path = ?path,
        base_paths = ?config.aspect.base_paths,
        log_level = %config.observability.log_level,
        "Auto-log bootstrapped"
    );

    Ok(aspect)
}
