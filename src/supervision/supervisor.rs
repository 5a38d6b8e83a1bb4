//! Supervisor task.
//!
//! # Responsibilities
//! - Spawn one worker unit per slot and watch each for crashes
//! - Apply the restart policy and recreate crashed workers in place
//! - Escalate when the budget is exhausted
//! - Drain workers on shutdown, bounded by the drain timeout
//! - Fail messages stranded in the mailbox of a disabled slot

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinError, JoinSet};
use tokio::time::Instant;

use crate::lifecycle::Shutdown;
use crate::load_balancer::{SlotState, WorkerRoster};
use crate::observability::metrics;
use crate::resilience::BreakerSettings;
use crate::supervision::policy::{
    Directive, EscalationScope, FaultClassifier, RestartWindow, SupervisionEscalation,
    SupervisionPolicy, WorkerFault,
};
use crate::worker::{
    Envelope, ProcessingError, Processor, SharedMailbox, StatusStore, WorkerReply, WorkerUnit,
};

/// Everything needed to build a worker for any slot.
#[derive(Clone)]
pub struct WorkerSpec {
    pub breaker: BreakerSettings,
    pub processor: Arc<dyn Processor>,
    pub status_store: Arc<dyn StatusStore>,
}

impl WorkerSpec {
    pub fn build(&self, index: usize, restart_count: u32) -> WorkerUnit {
        WorkerUnit::new(
            index,
            restart_count,
            self.breaker,
            self.processor.clone(),
            self.status_store.clone(),
        )
    }
}

type WorkerExit = (usize, Result<(), JoinError>);

/// Owns the worker tasks and the pool-wide restart budget.
pub struct Supervisor {
    spec: WorkerSpec,
    mailboxes: Vec<SharedMailbox>,
    roster: Arc<WorkerRoster>,
    policy: SupervisionPolicy,
    classifier: Arc<dyn FaultClassifier>,
    budget: RestartWindow,
    restarts: Vec<u32>,
    drain_timeout: Duration,
    shutdown: Shutdown,
    escalation: watch::Sender<Option<SupervisionEscalation>>,
    workers: JoinSet<WorkerExit>,
    /// Handles onto the worker tasks themselves; `workers` only holds their watchers.
    running: Vec<Option<AbortHandle>>,
}

impl Supervisor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        spec: WorkerSpec,
        mailboxes: Vec<SharedMailbox>,
        roster: Arc<WorkerRoster>,
        policy: SupervisionPolicy,
        classifier: Arc<dyn FaultClassifier>,
        drain_timeout: Duration,
        shutdown: Shutdown,
        escalation: watch::Sender<Option<SupervisionEscalation>>,
    ) -> Self {
        let size = mailboxes.len();
        Self {
            spec,
            mailboxes,
            roster,
            budget: RestartWindow::new(policy.max_restarts, policy.window),
            policy,
            classifier,
            restarts: vec![0; size],
            drain_timeout,
            shutdown,
            escalation,
            workers: JoinSet::new(),
            running: (0..size).map(|_| None).collect(),
        }
    }

    /// Run until shutdown, or until a crash escalates to the whole pool.
    pub async fn run(mut self) -> Result<(), SupervisionEscalation> {
        let mut stop = self.shutdown.subscribe();

        for index in 0..self.mailboxes.len() {
            self.spawn_worker(index);
        }
        tracing::info!(
            workers = self.mailboxes.len(),
            max_restarts = self.policy.max_restarts,
            window_secs = self.policy.window.as_secs(),
            "Supervisor started"
        );

        let mut closing = self.shutdown.is_triggered();
        while !closing {
            tokio::select! {
                joined = self.workers.join_next() => match joined {
                    None => {
                        tracing::info!("All workers stopped");
                        return Ok(());
                    }
                    Some(Ok((index, Ok(())))) => {
                        tracing::debug!(worker = index, "Worker exited");
                    }
                    Some(Ok((index, Err(err)))) => {
                        if let Err(escalation) = self.on_worker_exit(index, err) {
                            self.abort_workers().await;
                            for index in 0..self.mailboxes.len() {
                                self.reject_backlog(index);
                            }
                            return Err(escalation);
                        }
                    }
                    Some(Err(err)) => {
                        tracing::error!(error = %err, "Worker watcher task failed");
                    }
                },
                _ = stop.recv() => closing = true,
            }
        }

        self.drain().await;
        Ok(())
    }

    fn spawn_worker(&mut self, index: usize) {
        let unit = self.spec.build(index, self.restarts[index]);
        let mailbox = self.mailboxes[index].clone();
        let shutdown = self.shutdown.clone();
        self.roster.set(index, SlotState::Live);

        // The inner task isolates the panic so the watcher can report which slot crashed.
        let worker = tokio::spawn(unit.run(mailbox, shutdown));
        self.running[index] = Some(worker.abort_handle());
        self.workers.spawn(async move { (index, worker.await) });
    }

    fn on_worker_exit(&mut self, index: usize, err: JoinError) -> Result<(), SupervisionEscalation> {
        if err.is_cancelled() {
            tracing::debug!(worker = index, "Worker task cancelled");
            return Ok(());
        }

        let fault = WorkerFault {
            worker: index,
            message: panic_message(err.into_panic()),
        };
        tracing::error!(worker = index, reason = %fault.message, "Worker crashed");
        self.roster.set(index, SlotState::Restarting);

        if self.shutdown.is_triggered() {
            tracing::warn!(worker = index, "Not restarting worker during shutdown");
            return Ok(());
        }

        let directive = self.classifier.classify(&fault);
        if directive == Directive::Restart && self.budget.try_record(Instant::now()) {
            self.restarts[index] += 1;
            tracing::info!(
                worker = index,
                restarts = self.restarts[index],
                "Restarting worker"
            );
            metrics::record_restart(index);
            self.spawn_worker(index);
            return Ok(());
        }

        self.escalate(fault)
    }

    fn escalate(&mut self, fault: WorkerFault) -> Result<(), SupervisionEscalation> {
        let escalation = SupervisionEscalation {
            worker: fault.worker,
            max_restarts: self.policy.max_restarts,
            window: self.policy.window,
            scope: self.policy.escalation,
            reason: fault.message,
        };
        metrics::record_escalation();

        match self.policy.escalation {
            EscalationScope::Worker => {
                self.roster.set(fault.worker, SlotState::Disabled);
                tracing::error!(worker = fault.worker, "Restart budget exhausted, slot disabled");
                self.reject_backlog(fault.worker);
            }
            EscalationScope::Pool => {
                self.roster.disable_all();
                tracing::error!(worker = fault.worker, "Restart budget exhausted, pool disabled");
            }
        }
        self.escalation.send_replace(Some(escalation.clone()));

        if self.roster.accepting_count() == 0 {
            return Err(escalation);
        }
        Ok(())
    }

    async fn drain(&mut self) {
        tracing::info!(timeout_secs = self.drain_timeout.as_secs(), "Draining workers");
        let workers = &mut self.workers;
        let drained = tokio::time::timeout(self.drain_timeout, async {
            while let Some(joined) = workers.join_next().await {
                if let Ok((index, Err(err))) = joined {
                    if err.is_panic() {
                        tracing::error!(worker = index, "Worker crashed while draining");
                    }
                }
            }
        })
        .await;

        if drained.is_err() {
            tracing::warn!("Drain timeout elapsed, aborting remaining workers");
            self.abort_workers().await;
        }
    }

    /// Abort every worker task and wait for their watchers to observe it.
    async fn abort_workers(&mut self) {
        for handle in self.running.iter_mut().filter_map(Option::take) {
            handle.abort();
        }
        while self.workers.join_next().await.is_some() {}
    }

    /// Close a disabled slot's mailbox and fail everything still queued in it.
    ///
    /// Only valid once the slot's worker has exited; a live worker holds the lock.
    fn reject_backlog(&self, index: usize) {
        if self.roster.state(index) != SlotState::Disabled {
            return;
        }
        let Ok(mut inbox) = self.mailboxes[index].try_lock() else {
            tracing::warn!(worker = index, "Mailbox still held, backlog not rejected");
            return;
        };

        inbox.close();
        let mut rejected = 0usize;
        while let Ok(Envelope { message, reply_to }) = inbox.try_recv() {
            rejected += 1;
            if let Some(reply_to) = reply_to {
                let error = ProcessingError::worker_unavailable(message.id().clone());
                let _ = reply_to.send(WorkerReply::Failed(error));
            }
        }
        if rejected > 0 {
            tracing::warn!(worker = index, rejected, "Rejected messages queued on disabled slot");
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}
