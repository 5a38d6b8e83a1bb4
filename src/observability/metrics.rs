//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pool_dispatch_total` (counter): messages dispatched, by worker
//! - `pool_requests_total` (counter): processing outcomes, by outcome
//! - `pool_processing_duration_seconds` (histogram): processing latency
//! - `pool_breaker_transitions_total` (counter): breaker transitions, by worker and target phase
//! - `pool_worker_restarts_total` (counter): supervised restarts, by worker
//! - `pool_escalations_total` (counter): exhausted restart budgets
//! - `pool_ask_timeouts_total` (counter): caller deadlines missed

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::resilience::BreakerPhase;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_dispatch(worker: usize) {
    ::metrics::counter!("pool_dispatch_total", "worker" => worker.to_string()).increment(1);
}

pub fn record_outcome(outcome: &'static str, elapsed: Duration) {
    ::metrics::counter!("pool_requests_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("pool_processing_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_breaker_transition(worker: usize, to: BreakerPhase) {
    ::metrics::counter!(
        "pool_breaker_transitions_total",
        "worker" => worker.to_string(),
        "to" => to.as_str()
    )
    .increment(1);
}

pub fn record_restart(worker: usize) {
    ::metrics::counter!("pool_worker_restarts_total", "worker" => worker.to_string()).increment(1);
}

pub fn record_escalation() {
    ::metrics::counter!("pool_escalations_total").increment(1);
}

pub fn record_ask_timeout() {
    ::metrics::counter!("pool_ask_timeouts_total").increment(1);
}
