//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the pool
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::supervision::EscalationScope;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct PoolConfig {
    /// HTTP listener for the facade.
    pub listener: ListenerConfig,

    /// Worker count and mailbox sizing.
    pub pool: PoolSizeConfig,

    /// Per-worker circuit breaker thresholds.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Crash restart policy.
    pub supervision: SupervisionConfig,

    /// Caller-side deadlines.
    pub gateway: GatewayConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,

    pub shutdown: ShutdownConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PoolSizeConfig {
    /// Number of worker units. Fixed for the lifetime of the pool.
    pub size: usize,

    /// Bound on each worker's inbound queue.
    pub mailbox_capacity: usize,
}

impl Default for PoolSizeConfig {
    fn default() -> Self {
        Self {
            size: 10,
            mailbox_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the breaker opens.
    pub max_failures: u32,

    /// Processor call timeout in seconds.
    pub call_timeout_secs: u64,

    /// Seconds the breaker stays open before a probe is allowed.
    pub reset_timeout_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            call_timeout_secs: 30,
            reset_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SupervisionConfig {
    /// Restarts allowed across the pool within the window.
    pub max_restarts: u32,

    /// Trailing window in seconds.
    pub window_secs: u64,

    /// What to take out of service once the budget is exhausted.
    pub escalation: EscalationScope,
}

impl Default for SupervisionConfig {
    fn default() -> Self {
        Self {
            max_restarts: 10,
            window_secs: 60,
            escalation: EscalationScope::Pool,
        }
    }
}

/// Bounded-wait deadlines per operation.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Deadline for submit-and-wait, in seconds.
    pub process_timeout_secs: u64,

    /// Deadline for status queries, in seconds.
    pub status_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            process_timeout_secs: 5,
            status_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Time allowed for workers to drain their mailboxes.
    pub drain_timeout_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: 30,
        }
    }
}
