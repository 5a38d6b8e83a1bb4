//! Shared utilities for integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use processing_pool::lifecycle::{PoolSettings, ProcessingPool, Shutdown};
use processing_pool::resilience::BreakerSettings;
use processing_pool::worker::{FixedStatusStore, ProcessResult, Processor, ProcessorError};

/// Processor driven by its payload:
/// - `fail...` returns an error
/// - `panic...` panics
/// - `sleep:<ms>` sleeps, then succeeds
/// - anything else succeeds immediately
///
/// Every payload is recorded in arrival order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProcessor {
    seen: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl ScriptedProcessor {
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Processor for ScriptedProcessor {
    async fn process(&self, payload: String) -> Result<ProcessResult, ProcessorError> {
        self.seen.lock().unwrap().push(payload.clone());

        if payload.starts_with("fail") {
            return Err(ProcessorError::new(format!("scripted failure: {payload}")));
        }
        if payload.starts_with("panic") {
            panic!("scripted panic: {payload}");
        }
        if let Some(ms) = payload.strip_prefix("sleep:") {
            let ms: u64 = ms.parse().unwrap();
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        Ok(ProcessResult {
            success: true,
            message: format!("done: {payload}"),
        })
    }
}

#[allow(dead_code)]
pub fn settings(size: usize) -> PoolSettings {
    PoolSettings {
        size,
        mailbox_capacity: 16,
        drain_timeout: Duration::from_secs(5),
        ..PoolSettings::default()
    }
}

#[allow(dead_code)]
pub fn breaker(max_failures: u32, call_timeout: Duration, reset_timeout: Duration) -> BreakerSettings {
    BreakerSettings {
        max_failures,
        call_timeout,
        reset_timeout,
    }
}

/// Start a pool over a fresh [`ScriptedProcessor`].
#[allow(dead_code)]
pub fn start_pool(settings: PoolSettings) -> (ProcessingPool, ScriptedProcessor, Shutdown) {
    let processor = ScriptedProcessor::default();
    let shutdown = Shutdown::new();
    let pool = ProcessingPool::start(
        settings,
        Arc::new(processor.clone()),
        Arc::new(FixedStatusStore::default()),
        &shutdown,
    )
    .unwrap();
    (pool, processor, shutdown)
}
