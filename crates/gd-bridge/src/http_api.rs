use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, JsonRejection},
        DefaultBodyLimit, Path, State,
    },
    http::{header, HeaderMap, StatusCode},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use gd_api_types::{
    ApiDevice, ApiStatus, BridgeResponse, CommandBody, CommandResponse, RESULT_OK,
    STATUS_UPDATED_MESSAGE,
};
use gd_core::types::{DeviceId, DeviceRecord, DoorCommand};
use gd_telemetry::metrics::{global_metrics, STATUS_UPDATES};
use gd_telemetry::middleware::{metrics_middleware, request_id_middleware};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::bridge::Bridge;
use crate::error::BridgeError;
use crate::forwarded::ForwardedFor;

/// Default cap on request bodies; a status report is well under 100 bytes.
pub const DEFAULT_BODY_LIMIT: usize = 4096;

/// Shared state for all handlers.
pub struct ApiState {
    pub bridge: Arc<Bridge>,
    pub start_time: Instant,
}

impl ApiState {
    pub fn new(bridge: Arc<Bridge>) -> Self {
        Self {
            bridge,
            start_time: Instant::now(),
        }
    }
}

/// Build the router with the default body limit.
pub fn api_router(state: Arc<ApiState>) -> Router {
    api_router_with_limit(state, DEFAULT_BODY_LIMIT)
}

pub fn api_router_with_limit(state: Arc<ApiState>, body_limit: usize) -> Router {
    Router::new()
        .route("/doorStatusUpdate", post(door_status_update))
        .route("/api/status", get(get_status))
        .route("/api/devices", get(list_devices))
        .route("/api/devices/{id}", get(get_device))
        .route("/api/devices/{id}/commands", post(send_device_command))
        .route("/api/metrics", get(get_metrics))
        .route("/api/metrics/json", get(get_metrics_json))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn(metrics_middleware))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Device → bridge
// ---------------------------------------------------------------------------

/// `POST /doorStatusUpdate`. The response is produced only after the
/// `doorState` write is acknowledged; the address update continues after it.
async fn door_status_update(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            let err = BridgeError::from(rejection);
            warn!(error = %err, "rejected door status update body");
            global_metrics().increment_counter(STATUS_UPDATES, &[("outcome", err.kind())]);
            return err.into_response();
        }
    };
    let body = match std::str::from_utf8(&body) {
        Ok(body) => body,
        Err(e) => {
            return BridgeError::InvalidData(format!("request body is not UTF-8: {e}"))
                .into_response()
        }
    };
    let source = ForwardedFor::from_headers(&headers);
    match state.bridge.handle_status_payload(body, source).await {
        Ok(_receipt) => Json(BridgeResponse::ok(STATUS_UPDATED_MESSAGE)).into_response(),
        Err(e) => e.into_response(),
    }
}

// ---------------------------------------------------------------------------
// Operator endpoints
// ---------------------------------------------------------------------------

fn to_api_device(record: &DeviceRecord) -> ApiDevice {
    ApiDevice {
        id: record.id.to_string(),
        door_state: record.door_state.map(|s| s.code()),
        remote_ip_address: record.remote_ip_address.clone(),
        last_ip_update: record.last_ip_update,
    }
}

fn parse_device_id(raw: &str) -> Result<DeviceId, BridgeError> {
    DeviceId::parse(raw).map_err(|_| BridgeError::InvalidCredentials)
}

async fn get_status(State(state): State<Arc<ApiState>>) -> Result<Json<ApiStatus>, BridgeError> {
    let device_count = state.bridge.devices().await?.len();
    Ok(Json(ApiStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        device_count,
    }))
}

async fn list_devices(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<ApiDevice>>, BridgeError> {
    let devices = state.bridge.devices().await?;
    Ok(Json(devices.iter().map(to_api_device).collect()))
}

async fn get_device(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiDevice>, BridgeError> {
    let id = parse_device_id(&id)?;
    let record = state.bridge.device(&id).await?;
    Ok(Json(to_api_device(&record)))
}

async fn send_device_command(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    body: Result<Json<CommandBody>, JsonRejection>,
) -> Result<Json<CommandResponse>, BridgeError> {
    let id = parse_device_id(&id)?;
    let Json(body) = body?;
    let command: DoorCommand = body
        .command
        .parse()
        .map_err(|e: gd_core::types::CoreError| BridgeError::InvalidData(e.to_string()))?;
    let ack = state
        .bridge
        .dispatch_to_device(&id, command, body.address, body.port)
        .await?;
    Ok(Json(CommandResponse {
        result: RESULT_OK.to_string(),
        message: format!("{command} acknowledged by device"),
        url: ack.url,
    }))
}

async fn get_metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        global_metrics().export_prometheus(),
    )
}

async fn get_metrics_json() -> Json<serde_json::Value> {
    Json(global_metrics().export_json())
}
