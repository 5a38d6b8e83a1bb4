//! A single worker unit.
//!
//! # Responsibilities
//! - Drain its mailbox strictly in arrival order, one message at a time
//! - Guard every processor call with its own circuit breaker
//! - Reply directly to the caller captured in each envelope
//!
//! # Design Decisions
//! - The breaker is a plain field: only this worker's task touches it
//! - The mailbox sits behind an async mutex held for the worker's lifetime;
//!   a crash releases it for the replacement without losing queued messages
//! - On shutdown the mailbox is closed and the backlog is drained before exit

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;

use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::resilience::timeouts::detached;
use crate::resilience::{BreakerSettings, CircuitBreaker};
use crate::worker::messages::{
    Envelope, ProcessingError, ProcessingRequest, ProcessingResponse, StatusQuery, StatusResult,
    WorkerMessage, WorkerReply,
};
use crate::worker::processor::{Processor, StatusStore};

/// Receiving half of a worker's mailbox, shared across incarnations of the same slot.
pub type SharedMailbox = Arc<Mutex<mpsc::Receiver<Envelope>>>;

/// One slot of the pool: a breaker plus the collaborators it protects.
pub struct WorkerUnit {
    index: usize,
    restart_count: u32,
    breaker: CircuitBreaker,
    processor: Arc<dyn Processor>,
    status_store: Arc<dyn StatusStore>,
}

impl WorkerUnit {
    /// Build a worker with a fresh, closed breaker.
    pub fn new(
        index: usize,
        restart_count: u32,
        settings: BreakerSettings,
        processor: Arc<dyn Processor>,
        status_store: Arc<dyn StatusStore>,
    ) -> Self {
        Self {
            index,
            restart_count,
            breaker: CircuitBreaker::new(index, settings),
            processor,
            status_store,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn restart_count(&self) -> u32 {
        self.restart_count
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Serve the mailbox until it is closed and empty.
    pub async fn run(mut self, mailbox: SharedMailbox, shutdown: Shutdown) {
        let mut stop = shutdown.subscribe();
        let mut inbox = mailbox.lock().await;
        let mut closing = shutdown.is_triggered();
        if closing {
            inbox.close();
        }

        tracing::debug!(
            worker = self.index,
            restarts = self.restart_count,
            "Worker unit started"
        );

        loop {
            let envelope = tokio::select! {
                envelope = inbox.recv() => envelope,
                _ = stop.recv(), if !closing => {
                    closing = true;
                    inbox.close();
                    tracing::debug!(worker = self.index, backlog = inbox.len(), "Draining mailbox");
                    continue;
                }
            };

            let Some(Envelope { message, reply_to }) = envelope else {
                break;
            };

            let id = message.id().clone();
            let reply = self.handle(message).await;

            match reply_to {
                Some(reply_to) => {
                    if reply_to.send(reply).is_err() {
                        tracing::debug!(worker = self.index, request_id = %id, "Caller stopped waiting, reply discarded");
                    }
                }
                None => {
                    tracing::trace!(worker = self.index, request_id = %id, reply = ?reply, "No reply address");
                }
            }
        }

        tracing::debug!(worker = self.index, "Worker unit stopped");
    }

    /// Handle one message and produce its reply.
    pub async fn handle(&mut self, message: WorkerMessage) -> WorkerReply {
        match message {
            WorkerMessage::Process(request) => self.handle_process(request).await,
            WorkerMessage::Status(query) => self.handle_status(query).await,
        }
    }

    async fn handle_process(&mut self, request: ProcessingRequest) -> WorkerReply {
        let started = Instant::now();
        let ProcessingRequest { id, payload } = request;
        let processor = self.processor.clone();

        let outcome = self
            .breaker
            .call(move || detached(async move { processor.process(payload).await }))
            .await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(result) => {
                tracing::info!(
                    worker = self.index,
                    request_id = %id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Processed request"
                );
                metrics::record_outcome("success", elapsed);
                WorkerReply::Processed(ProcessingResponse {
                    id,
                    result,
                    elapsed,
                })
            }
            Err(e) => {
                let error = ProcessingError::from_breaker(id, e);
                tracing::error!(
                    worker = self.index,
                    request_id = %error.id,
                    kind = error.kind.as_str(),
                    error = %error.message,
                    phase = %self.breaker.phase(),
                    "Processing failed"
                );
                metrics::record_outcome(error.kind.as_str(), elapsed);
                WorkerReply::Failed(error)
            }
        }
    }

    async fn handle_status(&self, query: StatusQuery) -> WorkerReply {
        tracing::debug!(worker = self.index, request_id = %query.id, "Received status query");

        if query.id.is_empty() {
            tracing::warn!(worker = self.index, "Invalid request ID for status query");
            return WorkerReply::Failed(ProcessingError::invalid_request_id(query.id));
        }

        let status = self.status_store.status(&query.id).await;
        tracing::info!(worker = self.index, request_id = %query.id, status = %status, "Retrieved status");
        WorkerReply::Status(StatusResult { status })
    }
}
