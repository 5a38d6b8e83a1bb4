//! HTTP facade over the gateway.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, request id + trace layers)
//!     → request.rs (JSON bodies → worker messages)
//!     → gateway (ask with per-operation deadline, or tell)
//!     → response.rs (reply / gateway error → status code + JSON)
//! ```
//!
//! # Design Decisions
//! - Caller deadlines come from config, one per operation
//! - AskTimeout maps to 504, never to a processing-failure status

pub mod request;
pub mod response;
pub mod server;

pub use server::{AppState, HttpServer};
