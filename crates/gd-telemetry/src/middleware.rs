use axum::{
    body::Body,
    extract::{MatchedPath, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::metrics::{global_metrics, API_REQUESTS, API_REQUEST_DURATION};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 32 hex characters, usable as an OpenTelemetry trace id.
pub fn generate_request_id() -> String {
    Uuid::new_v4().as_simple().to_string()
}

/// Reuse the caller's `X-Request-Id` or mint one, run the request inside an
/// `http_request` span carrying it, and echo it on the response.
pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(generate_request_id);

    let header = HeaderValue::from_str(&request_id)
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
    request
        .headers_mut()
        .insert(REQUEST_ID_HEADER, header.clone());

    let span = tracing::info_span!(
        "http_request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    let mut response = next.run(request).instrument(span).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, header);
    response
}

/// Count each request by method, route and status, and time it.
///
/// The matched route template is used as the `path` label so device ids in
/// the URL do not explode label cardinality.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    let m = global_metrics();
    m.increment_counter(
        API_REQUESTS,
        &[("method", &method), ("path", &path), ("status", &status)],
    );
    m.record_duration(API_REQUEST_DURATION, start.elapsed().as_secs_f64());

    response
}
