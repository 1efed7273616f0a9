//! Bridge error taxonomy and its HTTP rendering.
//!
//! Every error leaves through the same `{"result": "ERROR", "message": ...}`
//! envelope devices already parse for successes.

use axum::{
    extract::rejection::{BytesRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gd_api_types::BridgeResponse;
use gd_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// Missing, non-string or wrong-length device id.
    #[error("invalid credentials on door status update request")]
    InvalidCredentials,

    /// Status code unparsable or outside `0..=100`, or the body itself is not JSON.
    #[error("invalid update data: {0}")]
    InvalidData(String),

    /// Request body exceeded the configured limit.
    #[error("request body too large: {0}")]
    PayloadTooLarge(String),

    /// The store rejected a write.
    #[error("store write failed: {0}")]
    StoreWriteFailed(#[source] StoreError),

    /// The forwarding header was neither an address nor a list of addresses.
    #[error("unknown address format: {0}")]
    UnknownAddressFormat(String),

    /// The command never reached the device, timed out, or was refused.
    #[error("command dispatch failed: {0}")]
    DispatchFailed(String),

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// The device exists but has never reported from an observable address.
    #[error("no known address for device {0}")]
    AddressUnknown(String),

    /// The store failed a read.
    #[error("store read failed: {0}")]
    Store(#[source] StoreError),
}

impl BridgeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BridgeError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            BridgeError::InvalidData(_) => StatusCode::BAD_REQUEST,
            BridgeError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            BridgeError::StoreWriteFailed(_) | BridgeError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            BridgeError::UnknownAddressFormat(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BridgeError::DispatchFailed(_) => StatusCode::BAD_GATEWAY,
            BridgeError::DeviceNotFound(_) => StatusCode::NOT_FOUND,
            BridgeError::AddressUnknown(_) => StatusCode::CONFLICT,
        }
    }

    /// Short label used for the `outcome` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::InvalidCredentials => "invalid_credentials",
            BridgeError::InvalidData(_) => "invalid_data",
            BridgeError::PayloadTooLarge(_) => "payload_too_large",
            BridgeError::StoreWriteFailed(_) => "store_write_failed",
            BridgeError::UnknownAddressFormat(_) => "unknown_address_format",
            BridgeError::DispatchFailed(_) => "dispatch_failed",
            BridgeError::DeviceNotFound(_) => "device_not_found",
            BridgeError::AddressUnknown(_) => "address_unknown",
            BridgeError::Store(_) => "store_read_failed",
        }
    }
}

impl BridgeError {
    /// Fold an extractor rejection into the taxonomy. An over-limit body keeps
    /// its 413; everything else is bad request data.
    pub fn from_rejection(status: StatusCode, detail: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            BridgeError::PayloadTooLarge(detail)
        } else {
            BridgeError::InvalidData(detail)
        }
    }
}

impl From<BytesRejection> for BridgeError {
    fn from(rejection: BytesRejection) -> Self {
        Self::from_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<JsonRejection> for BridgeError {
    fn from(rejection: JsonRejection) -> Self {
        Self::from_rejection(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(BridgeResponse::error(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn render(err: BridgeError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn invalid_credentials_envelope() {
        let (status, body) = render(BridgeError::InvalidCredentials).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["result"], "ERROR");
        assert!(body["message"].as_str().unwrap().contains("credentials"));
    }

    #[tokio::test]
    async fn invalid_data_envelope() {
        let (status, body) = render(BridgeError::InvalidData("status 101".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["result"], "ERROR");
        assert!(body["message"].as_str().unwrap().contains("status 101"));
    }

    #[tokio::test]
    async fn store_failure_is_internal() {
        let err = BridgeError::StoreWriteFailed(StoreError::Backend("disk full".into()));
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["message"].as_str().unwrap().contains("disk full"));
    }

    #[tokio::test]
    async fn dispatch_failure_is_bad_gateway() {
        let (status, _) = render(BridgeError::DispatchFailed("HTTP 500".into())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn rejections_keep_the_envelope() {
        let (status, body) = render(BridgeError::from_rejection(
            StatusCode::PAYLOAD_TOO_LARGE,
            "length limit exceeded".into(),
        ))
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["result"], "ERROR");

        let (status, body) = render(BridgeError::from_rejection(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "expected application/json".into(),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["result"], "ERROR");
    }
}
