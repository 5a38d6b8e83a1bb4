//! End-to-end behaviour of the pool through the gateway.

use std::time::Duration;

use processing_pool::gateway::GatewayError;
use processing_pool::worker::{
    FailureKind, ProcessingError, ProcessingRequest, RequestId, StatusQuery, StatusResult,
    WorkerReply,
};

mod common;

const WAIT: Duration = Duration::from_secs(60);

fn failure_kind(reply: &WorkerReply) -> Option<FailureKind> {
    match reply {
        WorkerReply::Failed(error) => Some(error.kind),
        _ => None,
    }
}

#[tokio::test(start_paused = true)]
async fn test_tell_distributes_round_robin() {
    let (pool, _processor, shutdown) = common::start_pool(common::settings(3));
    let gateway = pool.gateway();

    let mut workers = Vec::new();
    for i in 0..6 {
        let ack = gateway.tell(ProcessingRequest::new(format!("p{i}"))).await.unwrap();
        workers.push(ack.worker);
    }
    assert_eq!(workers, vec![0, 1, 2, 0, 1, 2]);

    shutdown.trigger();
    pool.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_worker_processes_in_arrival_order() {
    let (pool, processor, shutdown) = common::start_pool(common::settings(1));
    let gateway = pool.gateway();

    for i in 0..5 {
        gateway
            .tell(ProcessingRequest::new(format!("sleep:{}", 50 - i * 10)))
            .await
            .unwrap();
    }
    let reply = gateway.ask(ProcessingRequest::new("last"), WAIT).await.unwrap();
    assert!(matches!(reply, WorkerReply::Processed(_)));

    assert_eq!(
        processor.seen(),
        vec!["sleep:50", "sleep:40", "sleep:30", "sleep:20", "sleep:10", "last"]
    );

    shutdown.trigger();
    pool.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_ask_returns_processing_response() {
    let (pool, _processor, shutdown) = common::start_pool(common::settings(2));
    let gateway = pool.gateway();

    let request = ProcessingRequest::with_id("req-1", "sleep:100");
    let reply = gateway.ask(request, WAIT).await.unwrap();

    match reply {
        WorkerReply::Processed(response) => {
            assert_eq!(response.id, RequestId::from("req-1"));
            assert!(response.result.success);
            assert_eq!(response.result.message, "done: sleep:100");
            assert!(response.elapsed >= Duration::from_millis(100));
        }
        other => panic!("unexpected reply: {other:?}"),
    }

    shutdown.trigger();
    pool.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_status_query() {
    let (pool, _processor, shutdown) = common::start_pool(common::settings(2));
    let gateway = pool.gateway();

    let reply = gateway.ask(StatusQuery::new("req-1"), WAIT).await.unwrap();
    assert_eq!(
        reply,
        WorkerReply::Status(StatusResult {
            status: "Completed".into()
        })
    );

    let reply = gateway.ask(StatusQuery::new(""), WAIT).await.unwrap();
    assert_eq!(
        reply,
        WorkerReply::Failed(ProcessingError {
            id: RequestId::from(""),
            message: "Invalid request ID".into(),
            kind: FailureKind::Validation,
        })
    );

    shutdown.trigger();
    pool.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_breaker_opens_and_recovers() {
    let mut settings = common::settings(1);
    settings.breaker = common::breaker(3, Duration::from_secs(1), Duration::from_secs(2));
    let (pool, processor, shutdown) = common::start_pool(settings);
    let gateway = pool.gateway();

    for i in 0..3 {
        let reply = gateway.ask(ProcessingRequest::new(format!("fail-{i}")), WAIT).await.unwrap();
        assert_eq!(failure_kind(&reply), Some(FailureKind::ProcessingFailure));
    }

    // Open: rejected without reaching the processor.
    let reply = gateway.ask(ProcessingRequest::new("rejected"), WAIT).await.unwrap();
    assert_eq!(failure_kind(&reply), Some(FailureKind::CircuitOpen));
    assert!(!processor.seen().contains(&"rejected".to_string()));

    tokio::time::sleep(Duration::from_secs(2)).await;

    // Half-open trial succeeds and closes the breaker.
    let reply = gateway.ask(ProcessingRequest::new("probe"), WAIT).await.unwrap();
    assert!(matches!(reply, WorkerReply::Processed(_)));
    let reply = gateway.ask(ProcessingRequest::new("after"), WAIT).await.unwrap();
    assert!(matches!(reply, WorkerReply::Processed(_)));

    shutdown.trigger();
    pool.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_failed_probe_reopens_breaker() {
    let mut settings = common::settings(1);
    settings.breaker = common::breaker(1, Duration::from_secs(1), Duration::from_secs(2));
    let (pool, _processor, shutdown) = common::start_pool(settings);
    let gateway = pool.gateway();

    let reply = gateway.ask(ProcessingRequest::new("fail"), WAIT).await.unwrap();
    assert_eq!(failure_kind(&reply), Some(FailureKind::ProcessingFailure));

    tokio::time::sleep(Duration::from_secs(2)).await;
    let reply = gateway.ask(ProcessingRequest::new("fail-probe"), WAIT).await.unwrap();
    assert_eq!(failure_kind(&reply), Some(FailureKind::ProcessingFailure));

    let reply = gateway.ask(ProcessingRequest::new("ok"), WAIT).await.unwrap();
    assert_eq!(failure_kind(&reply), Some(FailureKind::CircuitOpen));

    shutdown.trigger();
    pool.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_call_timeout_counts_as_failure() {
    let mut settings = common::settings(1);
    settings.breaker = common::breaker(1, Duration::from_secs(1), Duration::from_secs(60));
    let (pool, _processor, shutdown) = common::start_pool(settings);
    let gateway = pool.gateway();

    let reply = gateway.ask(ProcessingRequest::new("sleep:5000"), WAIT).await.unwrap();
    assert_eq!(failure_kind(&reply), Some(FailureKind::CallTimeout));

    let reply = gateway.ask(ProcessingRequest::new("ok"), WAIT).await.unwrap();
    assert_eq!(failure_kind(&reply), Some(FailureKind::CircuitOpen));

    shutdown.trigger();
    pool.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_ask_timeout_is_not_a_breaker_failure() {
    let mut settings = common::settings(1);
    settings.breaker = common::breaker(1, Duration::from_secs(30), Duration::from_secs(60));
    let (pool, _processor, shutdown) = common::start_pool(settings);
    let gateway = pool.gateway();

    let result = gateway
        .ask(ProcessingRequest::new("sleep:6000"), Duration::from_secs(5))
        .await;
    assert_eq!(result, Err(GatewayError::AskTimeout(Duration::from_secs(5))));

    // The slow call still completes in the worker and counts as a success.
    let reply = gateway.ask(ProcessingRequest::new("ok"), WAIT).await.unwrap();
    assert!(matches!(reply, WorkerReply::Processed(_)));

    shutdown.trigger();
    pool.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_drains_queued_messages() {
    let (pool, processor, shutdown) = common::start_pool(common::settings(1));
    let gateway = pool.gateway();

    for i in 0..3 {
        gateway.tell(ProcessingRequest::new(format!("sleep:{}", 100 + i))).await.unwrap();
    }
    shutdown.trigger();
    pool.join().await.unwrap();

    assert_eq!(processor.seen(), vec!["sleep:100", "sleep:101", "sleep:102"]);

    let result = gateway.tell(ProcessingRequest::new("late")).await;
    assert_eq!(result.err(), Some(GatewayError::Closed));
}
