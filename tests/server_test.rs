//! Integration tests for the devicepulse HTTP server

use devicepulse::server::{run, ServerConfig};
use devicepulse::store::DeviceStore;
use devicepulse::validate::TimestampPolicy;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

async fn start_server(
    store: Arc<DeviceStore>,
    policy: TimestampPolicy,
) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let config = ServerConfig::new("127.0.0.1", 0, policy);
    let (addr, shutdown_tx) = run(config, store).await.expect("Failed to start server");

    // Give the server time to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    (addr, shutdown_tx)
}

fn device_url(addr: SocketAddr, device_id: &str, leaf: &str) -> String {
    format!("http://{addr}/api/v1/devices/{device_id}/{leaf}")
}

#[tokio::test]
async fn test_health_endpoint() {
    let store = Arc::new(DeviceStore::new());
    store.ensure("cam-1");
    store.ensure("cam-2");
    let (addr, shutdown_tx) = start_server(store, TimestampPolicy::default()).await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert!(body["version"].as_str().is_some());
    assert_eq!(body["device_count"], 2);

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_heartbeat_and_stats_flow() {
    let store = Arc::new(DeviceStore::new());
    store.ensure("cam-1");
    let (addr, shutdown_tx) = start_server(store, TimestampPolicy::disabled()).await;

    let client = reqwest::Client::new();

    // Heartbeats at 10:00 and 10:02 UTC; the first arrives with an offset
    // and must be normalized before bucketing.
    for sent_at in ["2025-10-25T12:00:00+02:00", "2025-10-25T10:02:00Z"] {
        let response = client
            .post(device_url(addr, "cam-1", "heartbeat"))
            .json(&json!({ "sent_at": sent_at }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);
    }

    // Two upload samples averaging to 5ns.
    for upload_time in [4, 6] {
        let response = client
            .post(device_url(addr, "cam-1", "stats"))
            .json(&json!({ "sent_at": "2025-10-25T10:02:30Z", "upload_time": upload_time }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);
    }

    let response = client
        .get(device_url(addr, "cam-1", "stats"))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let uptime = body["uptime"].as_f64().expect("uptime is a number");
    assert!((uptime - 66.67).abs() < 1e-9, "unexpected uptime {uptime}");
    assert_eq!(body["avg_upload_time"], "5ns");

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_stats_unknown_device() {
    let store = Arc::new(DeviceStore::new());
    let (addr, shutdown_tx) = start_server(store, TimestampPolicy::default()).await;

    let client = reqwest::Client::new();
    let response = client
        .get(device_url(addr, "ghost", "stats"))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "DEVICE_NOT_FOUND");

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_stats_without_history_is_no_content() {
    let store = Arc::new(DeviceStore::new());
    store.ensure("cam-1");
    let (addr, shutdown_tx) = start_server(store, TimestampPolicy::default()).await;

    let client = reqwest::Client::new();
    let response = client
        .get(device_url(addr, "cam-1", "stats"))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_heartbeat_auto_creates_device() {
    let store = Arc::new(DeviceStore::new());
    let (addr, shutdown_tx) = start_server(store, TimestampPolicy::disabled()).await;

    let client = reqwest::Client::new();
    let response = client
        .post(device_url(addr, "fresh-from-the-field", "heartbeat"))
        .json(&json!({ "sent_at": "2025-10-25T10:00:00Z" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);

    // A single heartbeat occupies one minute, which counts as full uptime.
    let response = client
        .get(device_url(addr, "fresh-from-the-field", "stats"))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["uptime"], 100.0);
    assert_eq!(body["avg_upload_time"], "0s");

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_heartbeat_rejects_unparseable_timestamp() {
    let store = Arc::new(DeviceStore::new());
    store.ensure("cam-1");
    let (addr, shutdown_tx) = start_server(store, TimestampPolicy::default()).await;

    let client = reqwest::Client::new();
    let response = client
        .post(device_url(addr, "cam-1", "heartbeat"))
        .json(&json!({ "sent_at": "yesterday at noon" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "BAD_TIMESTAMP");

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_timestamp_policy_rejects_stale_instants() {
    let store = Arc::new(DeviceStore::new());
    store.ensure("cam-1");
    let (addr, shutdown_tx) = start_server(store, TimestampPolicy::default()).await;

    let client = reqwest::Client::new();
    let response = client
        .post(device_url(addr, "cam-1", "stats"))
        .json(&json!({ "sent_at": "2000-01-01T00:00:00Z", "upload_time": 10 }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "BAD_TIMESTAMP");

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let store = Arc::new(DeviceStore::new());
    store.ensure("cam-1");
    let (addr, shutdown_tx) = start_server(store, TimestampPolicy::default()).await;

    let client = reqwest::Client::new();
    let response = client
        .post(device_url(addr, "cam-1", "heartbeat"))
        .header("Content-Type", "application/json")
        .body("this is not json")
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "INVALID_BODY");

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_cors_preflight() {
    let store = Arc::new(DeviceStore::new());
    let (addr, shutdown_tx) = start_server(store, TimestampPolicy::default()).await;

    let client = reqwest::Client::new();
    let response = client
        .request(
            reqwest::Method::OPTIONS,
            device_url(addr, "cam-1", "heartbeat"),
        )
        .header("Origin", "http://localhost")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .expect("Failed to send request");

    assert!(
        response.status().is_success() || response.status() == reqwest::StatusCode::NO_CONTENT,
        "CORS preflight failed: {}",
        response.status()
    );

    let _ = shutdown_tx.send(());
}
