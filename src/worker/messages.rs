//! Messages exchanged between callers and worker units.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::resilience::BreakerError;

/// Opaque request token, unique while the call is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A unit of work for the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingRequest {
    pub id: RequestId,
    pub payload: String,
}

impl ProcessingRequest {
    /// Create a request with a freshly generated id.
    pub fn new(payload: impl Into<String>) -> Self {
        Self::with_id(RequestId::generate(), payload)
    }

    pub fn with_id(id: impl Into<RequestId>, payload: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: payload.into(),
        }
    }
}

/// What the processor hands back for a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    pub success: bool,
    pub message: String,
}

/// Successful reply to a [`ProcessingRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResponse {
    pub id: RequestId,
    pub result: ProcessResult,
    #[serde(rename = "elapsed_ms", with = "duration_millis")]
    pub elapsed: Duration,
}

/// Category of a request-local failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Validation,
    ProcessingFailure,
    CallTimeout,
    CircuitOpen,
    /// The slot was disabled before the message was served.
    WorkerUnavailable,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Validation => "validation",
            FailureKind::ProcessingFailure => "processing_failure",
            FailureKind::CallTimeout => "call_timeout",
            FailureKind::CircuitOpen => "circuit_open",
            FailureKind::WorkerUnavailable => "worker_unavailable",
        }
    }
}

/// Failure reply. Always delivered as a value, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("request {id}: {message}")]
pub struct ProcessingError {
    pub id: RequestId,
    pub message: String,
    pub kind: FailureKind,
}

impl ProcessingError {
    pub fn invalid_request_id(id: RequestId) -> Self {
        Self {
            id,
            message: "Invalid request ID".to_string(),
            kind: FailureKind::Validation,
        }
    }

    /// Reply for a message stranded in the mailbox of a disabled slot.
    pub fn worker_unavailable(id: RequestId) -> Self {
        Self {
            id,
            message: "Worker disabled after exhausting its restart budget".to_string(),
            kind: FailureKind::WorkerUnavailable,
        }
    }

    /// Convert a breaker outcome for `id` into a reply.
    pub fn from_breaker(id: RequestId, error: BreakerError) -> Self {
        let kind = match error {
            BreakerError::CircuitOpen => FailureKind::CircuitOpen,
            BreakerError::CallTimeout(_) => FailureKind::CallTimeout,
            BreakerError::Failed(_) => FailureKind::ProcessingFailure,
        };
        Self {
            id,
            message: error.to_string(),
            kind,
        }
    }
}

/// Read-style request for the status of a previous request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusQuery {
    pub id: RequestId,
}

impl StatusQuery {
    pub fn new(id: impl Into<RequestId>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResult {
    pub status: String,
}

/// Anything a worker unit understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerMessage {
    Process(ProcessingRequest),
    Status(StatusQuery),
}

impl WorkerMessage {
    pub fn id(&self) -> &RequestId {
        match self {
            WorkerMessage::Process(request) => &request.id,
            WorkerMessage::Status(query) => &query.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WorkerMessage::Process(_) => "process",
            WorkerMessage::Status(_) => "status",
        }
    }
}

impl From<ProcessingRequest> for WorkerMessage {
    fn from(request: ProcessingRequest) -> Self {
        WorkerMessage::Process(request)
    }
}

impl From<StatusQuery> for WorkerMessage {
    fn from(query: StatusQuery) -> Self {
        WorkerMessage::Status(query)
    }
}

/// A worker's answer to one [`WorkerMessage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerReply {
    Processed(ProcessingResponse),
    Status(StatusResult),
    Failed(ProcessingError),
}

/// Where a worker sends its reply. Captured at dispatch time.
pub type ReplyTo = oneshot::Sender<WorkerReply>;

/// A message in flight to a worker, with the original caller attached.
#[derive(Debug)]
pub struct Envelope {
    pub message: WorkerMessage,
    pub reply_to: Option<ReplyTo>,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_distinct() {
        let a = ProcessingRequest::new("x");
        let b = ProcessingRequest::new("x");
        assert_ne!(a.id, b.id);
        assert!(!a.id.is_empty());
    }

    #[test]
    fn test_breaker_errors_map_to_kinds() {
        let id = RequestId::from("r1");
        let open = ProcessingError::from_breaker(id.clone(), BreakerError::CircuitOpen);
        assert_eq!(open.kind, FailureKind::CircuitOpen);

        let timeout = ProcessingError::from_breaker(
            id.clone(),
            BreakerError::CallTimeout(Duration::from_secs(30)),
        );
        assert_eq!(timeout.kind, FailureKind::CallTimeout);
        assert_eq!(timeout.message, "call timed out after 30000ms");

        let failed = ProcessingError::from_breaker(id, BreakerError::Failed("db down".into()));
        assert_eq!(failed.kind, FailureKind::ProcessingFailure);
        assert_eq!(failed.message, "db down");
    }

    #[test]
    fn test_response_serializes_elapsed_as_millis() {
        let response = ProcessingResponse {
            id: "r1".into(),
            result: ProcessResult {
                success: true,
                message: "ok".into(),
            },
            elapsed: Duration::from_millis(1500),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["elapsed_ms"], 1500);
        assert_eq!(json["id"], "r1");
    }
}
