//! Worker units.
//!
//! # Data Flow
//! ```text
//! Envelope arrives on the worker's mailbox (FIFO)
//!     → unit.rs (one message at a time)
//!         ProcessingRequest → circuit breaker → processor.rs (Processor)
//!         StatusQuery       → id validation   → processor.rs (StatusStore)
//!     → reply sent straight to the envelope's reply_to
//! ```
//!
//! # Design Decisions
//! - Processing failures are reply values, never panics
//! - A panic escaping a handler is a crash and is left to the supervisor
//! - The mailbox receiver outlives a crashed incarnation, so queued messages
//!   are served by its replacement

pub mod messages;
pub mod processor;
pub mod unit;

pub use messages::{
    Envelope, FailureKind, ProcessResult, ProcessingError, ProcessingRequest, ProcessingResponse,
    ReplyTo, RequestId, StatusQuery, StatusResult, WorkerMessage, WorkerReply,
};
pub use processor::{FixedStatusStore, Processor, ProcessorError, StatusStore, StubProcessor};
pub use unit::{SharedMailbox, WorkerUnit};
