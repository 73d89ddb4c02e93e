//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Evaluator, regex binder, map lookup:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters through the `metrics` facade)
//!
//! Consumers:
//!     → whatever subscriber / recorder the embedding server installs
//! ```
//!
//! # Design Decisions
//! - The library records but never exports; no recorder is installed here
//! - Metrics are cheap (atomic increments behind the facade)

pub mod logging;
pub mod metrics;
