//! Circuit breaker guarding calls to the external processor.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: processor assumed down, calls fail fast
//! - Half-Open: a single probe call decides whether to close or re-open
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= max_failures
//! Open → Half-Open: first call arriving after reset_timeout (becomes the probe)
//! Half-Open → Closed: probe succeeds (consecutive_failures = 0)
//! Half-Open → Open: probe fails (opened_at = now)
//! ```
//!
//! # Design Decisions
//! - Per-worker breaker (never shared across workers)
//! - Mutated through `&mut self` only, so no locking
//! - Uses `tokio::time::Instant` so the clock can be paused in tests

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

/// Phase of the breaker state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerPhase {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerPhase::Closed => "closed",
            BreakerPhase::Open => "open",
            BreakerPhase::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for BreakerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Breaker thresholds, fixed for the lifetime of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSettings {
    /// Consecutive failures that open the breaker.
    pub max_failures: u32,
    /// Longest a single processor call may run before it counts as failed.
    pub call_timeout: Duration,
    /// How long the breaker stays open before admitting a probe.
    pub reset_timeout: Duration,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            max_failures: 5,
            call_timeout: Duration::from_secs(30),
            reset_timeout: Duration::from_secs(60),
        }
    }
}

impl From<&CircuitBreakerConfig> for BreakerSettings {
    fn from(config: &CircuitBreakerConfig) -> Self {
        Self {
            max_failures: config.max_failures,
            call_timeout: Duration::from_secs(config.call_timeout_secs),
            reset_timeout: Duration::from_secs(config.reset_timeout_secs),
        }
    }
}

/// Why a guarded call did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BreakerError {
    #[error("circuit breaker is open")]
    CircuitOpen,

    #[error("call timed out after {}ms", .0.as_millis())]
    CallTimeout(Duration),

    #[error("{0}")]
    Failed(String),
}

/// Per-worker circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    worker: usize,
    settings: BreakerSettings,
    phase: BreakerPhase,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

impl CircuitBreaker {
    /// Create a closed breaker for the worker at `worker` in the pool.
    pub fn new(worker: usize, settings: BreakerSettings) -> Self {
        Self {
            worker,
            settings,
            phase: BreakerPhase::Closed,
            consecutive_failures: 0,
            opened_at: None,
            probe_in_flight: false,
        }
    }

    pub fn phase(&self) -> BreakerPhase {
        self.phase
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn opened_at(&self) -> Option<Instant> {
        self.opened_at
    }

    pub fn settings(&self) -> &BreakerSettings {
        &self.settings
    }

    /// Admit a call, or reject it with [`BreakerError::CircuitOpen`].
    ///
    /// The first call after `reset_timeout` moves the breaker to Half-Open and
    /// is admitted as the probe. Every admitted call must be followed by
    /// exactly one [`record_success`](Self::record_success) or
    /// [`record_failure`](Self::record_failure).
    pub fn try_acquire(&mut self) -> Result<(), BreakerError> {
        match self.phase {
            BreakerPhase::Closed => Ok(()),
            BreakerPhase::Open => {
                let cooled_down = self
                    .opened_at
                    .is_some_and(|at| at.elapsed() >= self.settings.reset_timeout);
                if cooled_down {
                    self.transition(BreakerPhase::HalfOpen);
                    self.probe_in_flight = true;
                    Ok(())
                } else {
                    Err(BreakerError::CircuitOpen)
                }
            }
            BreakerPhase::HalfOpen => {
                if self.probe_in_flight {
                    Err(BreakerError::CircuitOpen)
                } else {
                    self.probe_in_flight = true;
                    Ok(())
                }
            }
        }
    }

    /// Report that an admitted call succeeded.
    pub fn record_success(&mut self) {
        match self.phase {
            BreakerPhase::HalfOpen => {
                self.probe_in_flight = false;
                self.consecutive_failures = 0;
                self.opened_at = None;
                self.transition(BreakerPhase::Closed);
            }
            BreakerPhase::Closed => self.consecutive_failures = 0,
            BreakerPhase::Open => {}
        }
    }

    /// Report that an admitted call failed or timed out.
    pub fn record_failure(&mut self) {
        match self.phase {
            BreakerPhase::HalfOpen => {
                self.probe_in_flight = false;
                self.trip();
            }
            BreakerPhase::Closed => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                if self.consecutive_failures >= self.settings.max_failures {
                    self.trip();
                }
            }
            BreakerPhase::Open => {}
        }
    }

    /// Run `call` through the breaker, bounded by `call_timeout`.
    ///
    /// `call` is only invoked when the breaker admits the call. If the timeout
    /// fires, the future returned by `call` is dropped; whether that stops the
    /// underlying work is up to the future (see [`crate::resilience::timeouts::detached`]).
    pub async fn call<F, Fut, T, E>(&mut self, call: F) -> Result<T, BreakerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.try_acquire()?;

        match tokio::time::timeout(self.settings.call_timeout, call()).await {
            Ok(Ok(value)) => {
                self.record_success();
                Ok(value)
            }
            Ok(Err(e)) => {
                self.record_failure();
                Err(BreakerError::Failed(e.to_string()))
            }
            Err(_) => {
                self.record_failure();
                Err(BreakerError::CallTimeout(self.settings.call_timeout))
            }
        }
    }

    fn trip(&mut self) {
        self.opened_at = Some(Instant::now());
        self.transition(BreakerPhase::Open);
    }

    fn transition(&mut self, to: BreakerPhase) {
        if self.phase == to {
            return;
        }
        let from = self.phase;
        self.phase = to;

        match to {
            BreakerPhase::Open => tracing::warn!(
                worker = self.worker,
                from = %from,
                consecutive_failures = self.consecutive_failures,
                "Circuit breaker opened"
            ),
            BreakerPhase::HalfOpen => {
                tracing::info!(worker = self.worker, "Circuit breaker half-open")
            }
            BreakerPhase::Closed => tracing::info!(worker = self.worker, "Circuit breaker closed"),
        }
        metrics::record_breaker_transition(self.worker, to);
    }
}
