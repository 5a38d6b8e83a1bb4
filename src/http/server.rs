//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing)
//! - Translate HTTP calls into gateway asks and tells
//! - Stop accepting on shutdown

use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::gateway::Gateway;
use crate::http::request::{ProcessDataRequest, TransactionMessage};
use crate::http::response::{error_response, TransactionErrorResponse, TransactionResponse};
use crate::lifecycle::Shutdown;
use crate::worker::{StatusQuery, WorkerReply};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
    pub process_timeout: Duration,
    pub status_timeout: Duration,
    pub shutdown: Shutdown,
}

/// HTTP facade for the processing pool.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(gateway: Gateway, config: &GatewayConfig, shutdown: Shutdown) -> Self {
        let state = AppState {
            gateway,
            process_timeout: Duration::from_secs(config.process_timeout_secs),
            status_timeout: Duration::from_secs(config.status_timeout_secs),
            shutdown,
        };
        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/api/processing/process", post(process_data))
            .route("/api/processing/transaction", post(process_transaction))
            .route("/api/processing/status/{request_id}", get(get_status))
            .route("/health", get(health))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Serve until `shutdown` is triggered.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Submit and wait for the processing result.
async fn process_data(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ProcessDataRequest>,
) -> Response {
    let request = body.into_processing_request(&headers);
    tracing::info!(request_id = %request.id, "Processing request");

    match state.gateway.ask(request, state.process_timeout).await {
        Ok(WorkerReply::Processed(response)) => Json(response).into_response(),
        Ok(WorkerReply::Failed(error)) => error.into_response(),
        Ok(other) => unexpected_reply(other),
        Err(e) => e.into_response(),
    }
}

/// Fire-and-forget a transaction.
async fn process_transaction(
    State(state): State<AppState>,
    Json(transaction): Json<TransactionMessage>,
) -> Response {
    let transaction_id = transaction.transaction_id.to_string();
    tracing::info!(transaction_id = %transaction_id, "Processing transaction");

    let failure = |status: StatusCode, details: String| {
        tracing::error!(transaction_id = %transaction_id, error = %details, "Error processing transaction");
        (
            status,
            Json(TransactionErrorResponse {
                transaction_id: transaction_id.clone(),
                error: "Processing failed".to_string(),
                details,
                timestamp: Utc::now(),
            }),
        )
            .into_response()
    };

    let request = match transaction.to_processing_request() {
        Ok(request) => request,
        Err(e) => return failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    match state.gateway.tell(request).await {
        Ok(ack) => (
            StatusCode::ACCEPTED,
            Json(TransactionResponse {
                transaction_id: ack.id.to_string(),
                status: "Accepted".to_string(),
                message: "Transaction is being processed".to_string(),
                timestamp: ack.accepted_at,
            }),
        )
            .into_response(),
        Err(e) => failure(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    }
}

async fn get_status(State(state): State<AppState>, Path(request_id): Path<String>) -> Response {
    match state
        .gateway
        .ask(StatusQuery::new(request_id), state.status_timeout)
        .await
    {
        Ok(WorkerReply::Status(status)) => Json(status).into_response(),
        Ok(WorkerReply::Failed(error)) => error_response(StatusCode::BAD_REQUEST, error.message),
        Ok(other) => unexpected_reply(other),
        Err(e) => e.into_response(),
    }
}

async fn health(State(state): State<AppState>) -> StatusCode {
    if state.shutdown.is_triggered() || !state.gateway.is_available() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

fn unexpected_reply(reply: WorkerReply) -> Response {
    tracing::error!(reply = ?reply, "Unexpected reply type");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Unexpected response type",
    )
}
