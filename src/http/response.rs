//! Response mapping.
//!
//! # Responsibilities
//! - Map worker replies and gateway errors to HTTP status codes
//! - Shape the JSON bodies returned to clients
//!
//! # Design Decisions
//! - AskTimeout → 504 Gateway Timeout
//! - Unavailable, escalated or closing pool → 503
//! - Processing errors keep their kind in the body so clients can tell them apart

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::gateway::GatewayError;
use crate::worker::{FailureKind, ProcessingError};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: error.into() })).into_response()
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match self {
            GatewayError::AskTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::DispatchUnavailable
            | GatewayError::Escalated(_)
            | GatewayError::Closed => StatusCode::SERVICE_UNAVAILABLE,
        };
        error_response(status, self.to_string())
    }
}

/// Status code for a processing error reply.
pub fn processing_error_status(error: &ProcessingError) -> StatusCode {
    match error.kind {
        FailureKind::Validation => StatusCode::BAD_REQUEST,
        FailureKind::CircuitOpen | FailureKind::WorkerUnavailable => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        FailureKind::ProcessingFailure | FailureKind::CallTimeout => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ProcessingError {
    fn into_response(self) -> Response {
        (processing_error_status(&self), Json(self)).into_response()
    }
}

/// Body of a 202 for a told transaction.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionResponse {
    pub transaction_id: String,
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionErrorResponse {
    pub transaction_id: String,
    pub error: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}
