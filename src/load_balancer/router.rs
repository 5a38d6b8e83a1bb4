//! Dispatch router.
//!
//! # Responsibilities
//! - Hold one mailbox sender per pool slot
//! - Forward each message to the slot chosen by the load balancer
//! - Attach the caller's reply address so the worker answers it directly

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::load_balancer::{roster::WorkerRoster, round_robin::RoundRobin, LoadBalancer};
use crate::observability::metrics;
use crate::worker::messages::{Envelope, ReplyTo, WorkerMessage};

/// Why a message could not be handed to a worker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("no live worker available for dispatch")]
    Unavailable,

    #[error("mailbox of worker {0} is closed")]
    Closed(usize),
}

/// Routes messages across a fixed set of worker mailboxes.
#[derive(Debug)]
pub struct DispatchRouter {
    mailboxes: Vec<mpsc::Sender<Envelope>>,
    roster: Arc<WorkerRoster>,
    balancer: Box<dyn LoadBalancer>,
}

impl DispatchRouter {
    /// Create a round-robin router over `mailboxes`; slot `i` is `mailboxes[i]`.
    pub fn new(mailboxes: Vec<mpsc::Sender<Envelope>>, roster: Arc<WorkerRoster>) -> Self {
        Self::with_balancer(mailboxes, roster, Box::new(RoundRobin::new()))
    }

    pub fn with_balancer(
        mailboxes: Vec<mpsc::Sender<Envelope>>,
        roster: Arc<WorkerRoster>,
        balancer: Box<dyn LoadBalancer>,
    ) -> Self {
        debug_assert_eq!(mailboxes.len(), roster.len());
        Self {
            mailboxes,
            roster,
            balancer,
        }
    }

    /// Number of slots in the pool.
    pub fn size(&self) -> usize {
        self.mailboxes.len()
    }

    pub fn roster(&self) -> &Arc<WorkerRoster> {
        &self.roster
    }

    /// Forward `message` to the next slot and return that slot's index.
    ///
    /// Waits for room if the chosen mailbox is full. A slot that is being
    /// restarted still receives the message; it is served once the
    /// replacement worker is up.
    pub async fn dispatch(
        &self,
        message: WorkerMessage,
        reply_to: Option<ReplyTo>,
    ) -> Result<usize, DispatchError> {
        let index = self
            .balancer
            .next_slot(&self.roster)
            .ok_or(DispatchError::Unavailable)?;

        tracing::debug!(
            worker = index,
            request_id = %message.id(),
            kind = message.kind(),
            "Dispatching message"
        );

        self.mailboxes[index]
            .send(Envelope { message, reply_to })
            .await
            .map_err(|_| DispatchError::Closed(index))?;

        metrics::record_dispatch(index);
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::SlotState;
    use crate::worker::messages::{ProcessingRequest, StatusQuery};

    fn router(size: usize) -> (DispatchRouter, Vec<mpsc::Receiver<Envelope>>) {
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..size).map(|_| mpsc::channel(16)).unzip();
        let roster = Arc::new(WorkerRoster::new(size));
        (DispatchRouter::new(senders, roster), receivers)
    }

    #[tokio::test]
    async fn test_dispatch_rotates_across_slots() {
        let (router, mut inboxes) = router(3);

        let mut assigned = Vec::new();
        for i in 0..5 {
            let message = ProcessingRequest::with_id(format!("r{i}"), "x").into();
            assigned.push(router.dispatch(message, None).await.unwrap());
        }
        assert_eq!(assigned, vec![0, 1, 2, 0, 1]);

        let first = inboxes[0].recv().await.unwrap();
        assert_eq!(first.message.id().as_str(), "r0");
        let second = inboxes[0].recv().await.unwrap();
        assert_eq!(second.message.id().as_str(), "r3");
    }

    #[tokio::test]
    async fn test_dispatch_is_type_agnostic() {
        let (router, mut inboxes) = router(2);
        router.dispatch(StatusQuery::new("s").into(), None).await.unwrap();
        router.dispatch(ProcessingRequest::new("p").into(), None).await.unwrap();

        assert!(matches!(inboxes[0].recv().await.unwrap().message, WorkerMessage::Status(_)));
        assert!(matches!(inboxes[1].recv().await.unwrap().message, WorkerMessage::Process(_)));
    }

    #[tokio::test]
    async fn test_cursor_advances_on_failed_dispatch() {
        let (router, mut inboxes) = router(2);
        inboxes[0].close();

        let failed = router.dispatch(ProcessingRequest::new("a").into(), None).await;
        assert_eq!(failed, Err(DispatchError::Closed(0)));

        let next = router.dispatch(ProcessingRequest::new("b").into(), None).await;
        assert_eq!(next, Ok(1));
    }

    #[tokio::test]
    async fn test_unavailable_when_no_slot_accepts() {
        let (router, _inboxes) = router(2);
        router.roster().set(0, SlotState::Disabled);
        router.roster().set(1, SlotState::Disabled);

        let result = router.dispatch(ProcessingRequest::new("a").into(), None).await;
        assert_eq!(result, Err(DispatchError::Unavailable));
    }
}
