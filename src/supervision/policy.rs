//! Restart policy.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::SupervisionConfig;

/// What an exhausted restart budget takes out of service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationScope {
    /// Only the crashing slot stops receiving dispatch.
    Worker,
    /// The whole pool stops receiving dispatch.
    #[default]
    Pool,
}

/// Process-wide restart policy, fixed at pool construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisionPolicy {
    pub max_restarts: u32,
    pub window: Duration,
    pub escalation: EscalationScope,
}

impl Default for SupervisionPolicy {
    fn default() -> Self {
        Self {
            max_restarts: 10,
            window: Duration::from_secs(60),
            escalation: EscalationScope::Pool,
        }
    }
}

impl From<&SupervisionConfig> for SupervisionPolicy {
    fn from(config: &SupervisionConfig) -> Self {
        Self {
            max_restarts: config.max_restarts,
            window: Duration::from_secs(config.window_secs),
            escalation: config.escalation,
        }
    }
}

/// A worker crash as seen by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFault {
    pub worker: usize,
    pub message: String,
}

/// Decision for a single crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Restart,
    Escalate,
}

/// Hook deciding how a crash is treated before the restart budget is consulted.
pub trait FaultClassifier: Send + Sync + Debug {
    fn classify(&self, fault: &WorkerFault) -> Directive;
}

/// Restarts on every fault type.
///
/// This does not tell transient from permanent faults; a fault that recurs on
/// every restart burns the whole budget before escalating.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRestart;

impl FaultClassifier for AlwaysRestart {
    fn classify(&self, _fault: &WorkerFault) -> Directive {
        Directive::Restart
    }
}

/// Sliding record of recent restarts across the whole pool.
#[derive(Debug)]
pub struct RestartWindow {
    max_restarts: u32,
    window: Duration,
    restarts: VecDeque<Instant>,
}

impl RestartWindow {
    pub fn new(max_restarts: u32, window: Duration) -> Self {
        Self {
            max_restarts,
            window,
            restarts: VecDeque::new(),
        }
    }

    /// Restarts recorded within the trailing window as of `now`.
    pub fn count(&mut self, now: Instant) -> usize {
        self.prune(now);
        self.restarts.len()
    }

    /// Record a restart at `now` if the budget allows one. Returns false when exhausted.
    pub fn try_record(&mut self, now: Instant) -> bool {
        self.prune(now);
        if self.restarts.len() < self.max_restarts as usize {
            self.restarts.push_back(now);
            true
        } else {
            false
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.restarts.front() {
            if now.duration_since(oldest) >= self.window {
                self.restarts.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Pool-level fatal condition: a crash arrived with no restart budget left.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("worker {worker} crashed with restart budget exhausted ({max_restarts} restarts within {}s): {reason}", .window.as_secs())]
pub struct SupervisionEscalation {
    pub worker: usize,
    pub max_restarts: u32,
    pub window: Duration,
    pub scope: EscalationScope,
    pub reason: String,
}
