//! Request bodies accepted by the facade.

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::worker::{ProcessingRequest, RequestId};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Body of `POST /api/processing/process`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessDataRequest {
    /// Caller-chosen id; falls back to the `x-request-id` header, then a fresh id.
    #[serde(default)]
    pub request_id: Option<RequestId>,
    pub data: String,
}

impl ProcessDataRequest {
    pub fn into_processing_request(self, headers: &HeaderMap) -> ProcessingRequest {
        let id = self
            .request_id
            .filter(|id| !id.is_empty())
            .or_else(|| {
                headers
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .map(RequestId::from)
            })
            .unwrap_or_else(RequestId::generate);
        ProcessingRequest::with_id(id, self.data)
    }
}

/// Body of `POST /api/processing/transaction`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TransactionMessage {
    pub transaction_id: Uuid,
    pub account_from: String,
    pub account_to: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

impl TransactionMessage {
    /// Wrap the transaction as a processing request keyed by its id.
    pub fn to_processing_request(&self) -> Result<ProcessingRequest, serde_json::Error> {
        let payload = serde_json::to_string(self)?;
        Ok(ProcessingRequest::with_id(self.transaction_id.to_string(), payload))
    }
}
