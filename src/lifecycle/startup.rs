//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate pool settings
//! - Create one bounded mailbox per slot and the router over them
//! - Start the supervisor, which spawns the workers
//!
//! # Design Decisions
//! - Pool size is fixed here for the lifetime of the pool
//! - The router holds the senders, the supervisor holds the receivers;
//!   neither is recreated when a worker restarts

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use crate::config::PoolConfig;
use crate::gateway::Gateway;
use crate::lifecycle::Shutdown;
use crate::load_balancer::{DispatchRouter, WorkerRoster};
use crate::resilience::BreakerSettings;
use crate::supervision::{
    AlwaysRestart, FaultClassifier, Supervisor, SupervisionEscalation, SupervisionPolicy,
    WorkerSpec,
};
use crate::worker::{Processor, SharedMailbox, StatusStore};

/// Runtime settings of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub size: usize,
    pub mailbox_capacity: usize,
    pub breaker: BreakerSettings,
    pub supervision: SupervisionPolicy,
    pub drain_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            size: 10,
            mailbox_capacity: 1024,
            breaker: BreakerSettings::default(),
            supervision: SupervisionPolicy::default(),
            drain_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&PoolConfig> for PoolSettings {
    fn from(config: &PoolConfig) -> Self {
        Self {
            size: config.pool.size,
            mailbox_capacity: config.pool.mailbox_capacity,
            breaker: BreakerSettings::from(&config.circuit_breaker),
            supervision: SupervisionPolicy::from(&config.supervision),
            drain_timeout: Duration::from_secs(config.shutdown.drain_timeout_secs),
        }
    }
}

/// Errors raised by the pool itself, as opposed to per-request failures.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("pool size must be positive")]
    ZeroPoolSize,

    #[error("mailbox capacity must be positive")]
    ZeroMailboxCapacity,

    #[error(transparent)]
    Escalated(#[from] SupervisionEscalation),

    #[error("supervisor task failed: {0}")]
    Supervisor(#[from] tokio::task::JoinError),
}

/// A running pool: router, supervisor and its workers.
pub struct ProcessingPool {
    router: Arc<DispatchRouter>,
    escalation: watch::Receiver<Option<SupervisionEscalation>>,
    supervisor: JoinHandle<Result<(), SupervisionEscalation>>,
}

impl ProcessingPool {
    /// Start a pool that restarts crashed workers regardless of fault type.
    pub fn start(
        settings: PoolSettings,
        processor: Arc<dyn Processor>,
        status_store: Arc<dyn StatusStore>,
        shutdown: &Shutdown,
    ) -> Result<Self, PoolError> {
        Self::start_with_classifier(
            settings,
            processor,
            status_store,
            Arc::new(AlwaysRestart),
            shutdown,
        )
    }

    /// Start a pool with a custom crash classifier.
    pub fn start_with_classifier(
        settings: PoolSettings,
        processor: Arc<dyn Processor>,
        status_store: Arc<dyn StatusStore>,
        classifier: Arc<dyn FaultClassifier>,
        shutdown: &Shutdown,
    ) -> Result<Self, PoolError> {
        if settings.size == 0 {
            return Err(PoolError::ZeroPoolSize);
        }
        if settings.mailbox_capacity == 0 {
            return Err(PoolError::ZeroMailboxCapacity);
        }

        let (senders, receivers): (Vec<_>, Vec<_>) = (0..settings.size)
            .map(|_| mpsc::channel(settings.mailbox_capacity))
            .unzip();
        let mailboxes: Vec<SharedMailbox> = receivers
            .into_iter()
            .map(|rx| Arc::new(Mutex::new(rx)))
            .collect();

        let roster = Arc::new(WorkerRoster::new(settings.size));
        let router = Arc::new(DispatchRouter::new(senders, roster.clone()));
        let (escalation_tx, escalation) = watch::channel(None);

        let spec = WorkerSpec {
            breaker: settings.breaker,
            processor,
            status_store,
        };
        let supervisor = Supervisor::new(
            spec,
            mailboxes,
            roster,
            settings.supervision,
            classifier,
            settings.drain_timeout,
            shutdown.clone(),
            escalation_tx,
        );

        tracing::info!(
            size = settings.size,
            mailbox_capacity = settings.mailbox_capacity,
            max_failures = settings.breaker.max_failures,
            call_timeout_secs = settings.breaker.call_timeout.as_secs(),
            reset_timeout_secs = settings.breaker.reset_timeout.as_secs(),
            "Starting processing pool"
        );

        Ok(Self {
            router,
            escalation,
            supervisor: tokio::spawn(supervisor.run()),
        })
    }

    /// A caller handle onto this pool.
    pub fn gateway(&self) -> Gateway {
        Gateway::new(self.router.clone(), self.escalation.clone())
    }

    pub fn router(&self) -> &Arc<DispatchRouter> {
        &self.router
    }

    /// Latest escalation, if the restart budget has ever been exhausted.
    pub fn escalation(&self) -> watch::Receiver<Option<SupervisionEscalation>> {
        self.escalation.clone()
    }

    /// Wait for the supervisor to finish.
    ///
    /// Returns after shutdown has drained the workers, or early with
    /// [`PoolError::Escalated`] when no slot is left to dispatch to.
    pub async fn join(self) -> Result<(), PoolError> {
        self.supervisor.await??;
        Ok(())
    }
}
