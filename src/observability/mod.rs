//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Intercepted calls produce:
//!     → sink.rs records → TracingSink → logging.rs subscriber
//!     → metrics.rs (counters, histogram) when enabled
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty/compact/JSON)
//!     → Any `metrics` recorder the host application installs
//! ```
//!
//! # Design Decisions
//! - Structured fields (`method`, `record`) alongside the fixed message text
//! - Metrics are opt-in and cheap (no-ops without a recorder)

pub mod logging;
pub mod metrics;
