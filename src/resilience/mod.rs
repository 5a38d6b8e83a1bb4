//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Worker unit receives a processing request:
//!     → circuit_breaker.rs (admit, or fail fast while open)
//!     → timeouts.rs (run the processor call on its own task, bounded by call_timeout)
//!     → circuit_breaker.rs (record success or failure, transition phase)
//! ```
//!
//! # Design Decisions
//! - One breaker per worker unit, owned and mutated only by that worker
//! - Fail fast in Open state (processor is never invoked)
//! - Single probe in Half-Open
//! - A call timeout counts as a failure but does not abort the underlying call

pub mod circuit_breaker;
pub mod timeouts;

pub use circuit_breaker::{BreakerError, BreakerPhase, BreakerSettings, CircuitBreaker};
