//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway submits a message (+ reply_to for asks)
//!     → router.rs (pick slot, forward envelope to that worker's mailbox)
//!     → round_robin.rs (rotate through slots, skipping disabled ones)
//!     → roster.rs (per-slot liveness, written by the supervisor)
//! Reply flows worker → caller directly; the router never sees it.
//! ```
//!
//! # Design Decisions
//! - Fixed slot count for the lifetime of the pool
//! - Cursor advances exactly once per dispatched message, whatever the outcome
//! - A slot that is mid-restart still accepts messages (they queue)
//! - No retries in the router

pub mod roster;
pub mod round_robin;
pub mod router;

use std::fmt::Debug;

/// Slot selection strategy.
pub trait LoadBalancer: Send + Sync + Debug {
    /// Pick the slot for the next message, or `None` if no slot accepts work.
    fn next_slot(&self, roster: &WorkerRoster) -> Option<usize>;
}

pub use roster::{SlotState, WorkerRoster};
pub use round_robin::RoundRobin;
pub use router::{DispatchError, DispatchRouter};
