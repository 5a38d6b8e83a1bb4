//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, worker index and request id as fields)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - Structured logging via tracing; RUST_LOG overrides the configured level
//! - Metrics are cheap enough to record on every request
//! - Recording without an installed exporter is a no-op

pub mod logging;
pub mod metrics;
