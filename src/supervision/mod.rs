//! Crash supervision.
//!
//! # Data Flow
//! ```text
//! Worker task panics (crash, not a processing failure)
//!     → supervisor.rs observes the join error for that slot
//!     → policy.rs (classifier directive + pool-wide restart budget)
//!         within budget → recreate the worker at the same slot, fresh breaker
//!         exhausted     → disable the slot or the whole pool, surface escalation
//! ```
//!
//! # Design Decisions
//! - Restart budget is pool-wide and owned by the supervisor task alone
//! - Every crash is restarted by default; the classifier hook exists so a
//!   finer policy can tell transient from permanent faults later
//! - A recreated worker never inherits breaker state

pub mod policy;
pub mod supervisor;

pub use policy::{
    AlwaysRestart, Directive, EscalationScope, FaultClassifier, RestartWindow, SupervisionEscalation,
    SupervisionPolicy, WorkerFault,
};
pub use supervisor::{Supervisor, WorkerSpec};
