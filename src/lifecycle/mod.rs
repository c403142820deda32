//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Initialize logging → Build aspect → Enable
//!
//! Reload (optional, host-driven):
//!     ConfigWatcher → AutoLogAspect::follow → reconfigure
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then logging, then interception
//! - Fail fast: any startup error is returned before anything is enabled

pub mod startup;
