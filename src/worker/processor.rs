//! Collaborators injected into every worker unit.

use std::time::Duration;

use async_trait::async_trait;

use crate::worker::messages::{ProcessResult, RequestId};

/// A processor failure. Reported to the caller, never raised as a crash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ProcessorError(String);

impl ProcessorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The external, possibly unreliable processing operation.
///
/// Implementations may fail, run long, or panic. A panic is treated as a
/// worker crash.
#[async_trait]
pub trait Processor: Send + Sync + 'static {
    async fn process(&self, payload: String) -> Result<ProcessResult, ProcessorError>;
}

/// Source of status answers for [`StatusQuery`](crate::worker::StatusQuery).
#[async_trait]
pub trait StatusStore: Send + Sync + 'static {
    async fn status(&self, id: &RequestId) -> String;
}

/// Placeholder processor: rejects blank payloads, otherwise succeeds after a short delay.
#[derive(Debug, Clone)]
pub struct StubProcessor {
    delay: Duration,
}

impl StubProcessor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for StubProcessor {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

#[async_trait]
impl Processor for StubProcessor {
    async fn process(&self, payload: String) -> Result<ProcessResult, ProcessorError> {
        if payload.trim().is_empty() {
            tracing::warn!("Received empty payload for processing");
            return Err(ProcessorError::new("Data is empty or null"));
        }

        tracing::debug!(bytes = payload.len(), "Processing payload");
        tokio::time::sleep(self.delay).await;

        Ok(ProcessResult {
            success: true,
            message: "Processed successfully".to_string(),
        })
    }
}

/// Status store that answers every query with the same status.
#[derive(Debug, Clone)]
pub struct FixedStatusStore {
    status: String,
}

impl FixedStatusStore {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

impl Default for FixedStatusStore {
    fn default() -> Self {
        Self::new("Completed")
    }
}

#[async_trait]
impl StatusStore for FixedStatusStore {
    async fn status(&self, _id: &RequestId) -> String {
        self.status.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_stub_processor() {
        let processor = StubProcessor::default();

        let result = processor.process("Hello Bangladesh".into()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.message, "Processed successfully");

        let err = processor.process("   ".into()).await.unwrap_err();
        assert_eq!(err.to_string(), "Data is empty or null");
    }

    #[tokio::test]
    async fn test_fixed_status_store() {
        let store = FixedStatusStore::default();
        assert_eq!(store.status(&RequestId::from("abc")).await, "Completed");
    }
}
