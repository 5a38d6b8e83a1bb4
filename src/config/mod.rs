//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → PoolConfig (validated, immutable)
//!     → converted into runtime settings for the pool and gateway
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the pool never resizes
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    CircuitBreakerConfig, GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    PoolConfig, PoolSizeConfig, ShutdownConfig, SupervisionConfig,
};
pub use validation::{validate_config, ValidationError};
