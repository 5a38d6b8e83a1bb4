//! Fault-tolerant processing pool.
//!
//! Requests enter through the [`Gateway`], are routed round-robin to a fixed
//! set of worker units, and each worker protects the external processor with
//! its own circuit breaker. Crashed workers are recreated by the supervisor
//! within a bounded restart budget.

pub mod config;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;
pub mod supervision;
pub mod worker;

pub use config::PoolConfig;
pub use gateway::{Gateway, GatewayError};
pub use http::HttpServer;
pub use lifecycle::{PoolError, PoolSettings, ProcessingPool, Shutdown};
