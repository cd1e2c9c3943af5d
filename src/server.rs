//! HTTP interface for device telemetry.
//!
//! This module provides the server that:
//! - Accepts heartbeats and upload stats from fleet devices
//! - Serves derived statistics computed over store snapshots
//!
//! # Routes
//!
//! ```text
//! GET  /health                                -> service status
//! POST /api/v1/devices/:device_id/heartbeat   -> record a liveness signal
//! POST /api/v1/devices/:device_id/stats       -> record an upload sample
//! GET  /api/v1/devices/:device_id/stats       -> uptime + average upload
//! ```
//!
//! The store and statistics engine return typed results; this layer alone
//! maps them to status codes (not-found -> 404, bad timestamp -> 400,
//! empty history -> 204).

use crate::core::stats::{average_upload, round2, uptime_percent};
use crate::store::{DeviceStore, StoreError};
use crate::validate::{parse_sent_at, TimestampError, TimestampPolicy};
use axum::{
    extract::rejection::JsonRejection,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind to.
    pub host: String,
    /// Port to bind to (0 for random).
    pub port: u16,
    /// Sanity policy applied to inbound timestamps.
    pub timestamp_policy: TimestampPolicy,
}

impl ServerConfig {
    /// Create a new server configuration.
    pub fn new(host: impl Into<String>, port: u16, timestamp_policy: TimestampPolicy) -> Self {
        Self {
            host: host.into(),
            port,
            timestamp_policy,
        }
    }
}

/// Shared server state.
pub struct AppState {
    /// Device registry, shared with the bootstrap loader.
    store: Arc<DeviceStore>,
    /// Timestamp sanity policy.
    policy: TimestampPolicy,
    /// Identifier for this server process, reported by /health.
    instance_id: Uuid,
}

impl AppState {
    fn new(store: Arc<DeviceStore>, policy: TimestampPolicy) -> Self {
        Self {
            store,
            policy,
            instance_id: Uuid::new_v4(),
        }
    }
}

/// Heartbeat payload from a device.
#[derive(Debug, Deserialize)]
struct HeartbeatRequest {
    sent_at: String,
}

/// Upload stats payload from a device.
#[derive(Debug, Deserialize)]
struct UploadStatsRequest {
    sent_at: String,
    /// Upload duration in nanoseconds.
    upload_time: i64,
}

/// Derived statistics for a device.
#[derive(Debug, Serialize)]
struct StatsResponse {
    uptime: f64,
    avg_upload_time: String,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    instance_id: Uuid,
    device_count: usize,
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: String,
}

/// Typed handler failure, rendered as a JSON error body.
struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
                code: self.code.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<TimestampError> for ApiError {
    fn from(err: TimestampError) -> Self {
        Self::bad_request("BAD_TIMESTAMP", err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self {
                status: StatusCode::NOT_FOUND,
                code: "DEVICE_NOT_FOUND",
                message: format!("device not found: {id}"),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("INVALID_BODY", rejection.body_text())
    }
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        instance_id: state.instance_id,
        device_count: state.store.device_count(),
    })
}

/// POST /api/v1/devices/:device_id/heartbeat
///
/// Records a liveness signal. Unknown devices are created on first write.
async fn post_heartbeat(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
    payload: Result<Json<HeartbeatRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = payload?;
    let at = parse_sent_at(&request.sent_at, &state.policy, Utc::now())?;
    state.store.record_heartbeat(&device_id, at);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/devices/:device_id/stats
///
/// Records an upload-duration sample. `sent_at` is validated even though
/// only the duration is stored, so a corrupted clock is reported to the
/// device rather than ignored.
async fn post_upload_stats(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
    payload: Result<Json<UploadStatsRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = payload?;
    parse_sent_at(&request.sent_at, &state.policy, Utc::now())?;
    state.store.record_upload(&device_id, request.upload_time);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/devices/:device_id/stats
///
/// Computes statistics over a snapshot taken at a single instant; writes
/// that land mid-computation are not reflected. A registered device with
/// no history at all yields 204.
async fn get_stats(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> Result<Response, ApiError> {
    let snapshot = state.store.snapshot(&device_id)?;
    if snapshot.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let uptime = round2(uptime_percent(&snapshot.heartbeats));
    let average = average_upload(&snapshot.upload_samples);

    Ok(Json(StatsResponse {
        uptime,
        avg_upload_time: average.formatted,
    })
    .into_response())
}

/// Build the application router.
pub fn router(store: Arc<DeviceStore>, policy: TimestampPolicy) -> Router {
    let state = Arc::new(AppState::new(store, policy));

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/devices/:device_id/heartbeat", post(post_heartbeat))
        .route(
            "/api/v1/devices/:device_id/stats",
            post(post_upload_stats).get(get_stats),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server.
///
/// Binds the configured address (port 0 picks a free port, used by the
/// integration tests), then serves in a background task until the returned
/// shutdown sender fires.
pub async fn run(
    config: ServerConfig,
    store: Arc<DeviceStore>,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let app = router(store, config.timestamp_policy);

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("devicepulse listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("server shutdown signal received");
            })
            .await
        {
            tracing::error!("server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
