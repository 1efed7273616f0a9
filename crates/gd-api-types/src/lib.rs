//! Wire types shared by the bridge daemon and the `gd` CLI.
//!
//! Field names follow the JSON the deployed firmware and clients already
//! speak, so several structs rename away from snake_case.

use serde::{Deserialize, Serialize};

pub const RESULT_OK: &str = "OK";
pub const RESULT_ERROR: &str = "ERROR";

/// Message returned to a device after its report was persisted.
pub const STATUS_UPDATED_MESSAGE: &str = "Updated door status successfully";

// ── Device → bridge ──

/// Body of `POST /doorStatusUpdate`.
///
/// Both fields are kept as raw JSON so validation can distinguish a missing
/// or wrongly-typed `uid` from a bad `statusUpdate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusUpdatePayload {
    #[serde(rename = "statusUpdate", default)]
    pub status_update: Option<serde_json::Value>,
    #[serde(default)]
    pub uid: Option<serde_json::Value>,
}

impl StatusUpdatePayload {
    /// Build the payload the firmware sends (`statusUpdate` as a string).
    pub fn from_device(uid: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            status_update: Some(serde_json::Value::String(status.into())),
            uid: Some(serde_json::Value::String(uid.into())),
        }
    }
}

/// `{"result": "OK" | "ERROR", "message": ...}` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeResponse {
    pub result: String,
    pub message: String,
}

impl BridgeResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            result: RESULT_OK.to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            result: RESULT_ERROR.to_string(),
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result == RESULT_OK
    }
}

// ── Operator → bridge ──

/// Body of `POST /api/devices/{id}/commands`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandBody {
    /// Command name, e.g. `actuate-door` or `HealthCheck`.
    pub command: String,
    /// Overrides the device's last recorded address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Overrides the configured device port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub result: String,
    pub message: String,
    pub url: String,
}

/// Device view returned by `GET /api/devices[/{id}]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiDevice {
    pub id: String,
    #[serde(rename = "doorState", default)]
    pub door_state: Option<u8>,
    #[serde(rename = "remoteIPAddress", default)]
    pub remote_ip_address: Option<String>,
    #[serde(rename = "lastIPUpdate", default)]
    pub last_ip_update: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiStatus {
    pub version: String,
    pub uptime_seconds: u64,
    pub device_count: usize,
}
