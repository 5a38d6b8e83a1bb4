//! Caller gateway.
//!
//! # Responsibilities
//! - Bounded-wait submission (ask): one reply, or AskTimeout at the deadline
//! - Fire-and-forget submission (tell): acknowledgment once enqueued
//!
//! # Design Decisions
//! - The reply address is a oneshot created per call and carried to the worker;
//!   there is no correlation table
//! - AskTimeout is owned here and never cancels the worker's in-flight call
//! - A worker crash drops the reply address; the caller learns of it only
//!   through its own deadline

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{oneshot, watch};

use crate::load_balancer::{DispatchError, DispatchRouter};
use crate::observability::metrics;
use crate::supervision::SupervisionEscalation;
use crate::worker::{RequestId, WorkerMessage, WorkerReply};

/// Caller-side failures. Request-local processing failures arrive as
/// [`WorkerReply::Failed`] instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("no reply within {}ms", .0.as_millis())]
    AskTimeout(Duration),

    #[error("no live worker available for dispatch")]
    DispatchUnavailable,

    #[error("processing pool escalated: {0}")]
    Escalated(SupervisionEscalation),

    #[error("processing pool is shutting down")]
    Closed,
}

/// Receipt for a fire-and-forget submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Acknowledgment {
    pub id: RequestId,
    pub worker: usize,
    pub accepted_at: DateTime<Utc>,
}

/// Submits messages to the pool on behalf of callers.
#[derive(Debug, Clone)]
pub struct Gateway {
    router: Arc<DispatchRouter>,
    escalation: watch::Receiver<Option<SupervisionEscalation>>,
}

impl Gateway {
    pub fn new(
        router: Arc<DispatchRouter>,
        escalation: watch::Receiver<Option<SupervisionEscalation>>,
    ) -> Self {
        Self { router, escalation }
    }

    /// Send `message` and wait up to `deadline` for the worker's reply.
    ///
    /// The deadline covers waiting for mailbox room as well as the reply.
    pub async fn ask(
        &self,
        message: impl Into<WorkerMessage>,
        deadline: Duration,
    ) -> Result<WorkerReply, GatewayError> {
        let message = message.into();
        let id = message.id().clone();
        let (reply_to, reply) = oneshot::channel();

        let exchange = async {
            if let Err(e) = self.router.dispatch(message, Some(reply_to)).await {
                return Err(self.dispatch_failure(e));
            }

            match reply.await {
                Ok(reply) => Ok(reply),
                // Worker crashed mid-request; no reply will ever come.
                Err(_) => std::future::pending().await,
            }
        };

        match tokio::time::timeout(deadline, exchange).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(
                    request_id = %id,
                    deadline_ms = deadline.as_millis() as u64,
                    "Request timed out"
                );
                metrics::record_ask_timeout();
                Err(GatewayError::AskTimeout(deadline))
            }
        }
    }

    /// Enqueue `message` without waiting for a reply.
    pub async fn tell(&self, message: impl Into<WorkerMessage>) -> Result<Acknowledgment, GatewayError> {
        let message = message.into();
        let id = message.id().clone();

        let worker = self
            .router
            .dispatch(message, None)
            .await
            .map_err(|e| self.dispatch_failure(e))?;

        Ok(Acknowledgment {
            id,
            worker,
            accepted_at: Utc::now(),
        })
    }

    /// True once supervision has escalated.
    pub fn is_escalated(&self) -> bool {
        self.escalation.borrow().is_some()
    }

    /// True while at least one slot accepts new messages.
    pub fn is_available(&self) -> bool {
        self.router.roster().accepting_count() > 0
    }

    fn dispatch_failure(&self, error: DispatchError) -> GatewayError {
        match error {
            DispatchError::Unavailable => match self.escalation.borrow().clone() {
                Some(escalation) => GatewayError::Escalated(escalation),
                None => GatewayError::DispatchUnavailable,
            },
            DispatchError::Closed(_) => GatewayError::Closed,
        }
    }
}
