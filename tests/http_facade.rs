//! HTTP facade over a running pool.

use std::net::SocketAddr;

use processing_pool::config::GatewayConfig;
use processing_pool::lifecycle::Shutdown;
use processing_pool::HttpServer;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

mod common;

async fn start_server(
    gateway: processing_pool::Gateway,
    shutdown: &Shutdown,
) -> (SocketAddr, JoinHandle<Result<(), std::io::Error>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(gateway, &GatewayConfig::default(), shutdown.clone());
    let handle = tokio::spawn(server.run(listener, shutdown.clone()));
    (addr, handle)
}

#[tokio::test]
async fn test_process_endpoint() {
    let (pool, _processor, shutdown) = common::start_pool(common::settings(2));
    let (addr, server) = start_server(pool.gateway(), &shutdown).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("http://{addr}/api/processing/process"))
        .json(&json!({ "request_id": "req-7", "data": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["id"], "req-7");
    assert_eq!(body["result"]["success"], true);

    let res = client
        .post(format!("http://{addr}/api/processing/process"))
        .json(&json!({ "data": "fail" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["kind"], "processing_failure");

    shutdown.trigger();
    server.await.unwrap().unwrap();
    pool.join().await.unwrap();
}

#[tokio::test]
async fn test_transaction_and_status_endpoints() {
    let (pool, processor, shutdown) = common::start_pool(common::settings(2));
    let (addr, server) = start_server(pool.gateway(), &shutdown).await;
    let client = reqwest::Client::new();

    let transaction_id = uuid::Uuid::new_v4();
    let res = client
        .post(format!("http://{addr}/api/processing/transaction"))
        .json(&json!({
            "transaction_id": transaction_id,
            "account_from": "acc-1",
            "account_to": "acc-2",
            "amount": 12.5,
            "timestamp": chrono::Utc::now(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 202);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["transaction_id"], transaction_id.to_string());
    assert_eq!(body["status"], "Accepted");

    let res = client
        .get(format!("http://{addr}/api/processing/status/{transaction_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "Completed");

    let res = client.get(format!("http://{addr}/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    shutdown.trigger();
    server.await.unwrap().unwrap();
    pool.join().await.unwrap();

    let seen = processor.seen();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("acc-1"));
}
