//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Settings → mailboxes + roster → router → supervisor spawns workers
//!
//! Shutdown (shutdown.rs):
//!     Signal received → HTTP stops accepting → workers close and drain mailboxes
//!     → supervisor exits after drain (or drain timeout)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: invalid pool settings are rejected before anything is spawned
//! - Shutdown has a deadline; remaining workers are abandoned after it

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{PoolError, PoolSettings, ProcessingPool};
