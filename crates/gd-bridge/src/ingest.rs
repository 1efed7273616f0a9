//! Validation of inbound device status reports.

use gd_api_types::StatusUpdatePayload;
use gd_core::types::{DeviceId, DoorState};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::error::BridgeError;
use crate::forwarded::ForwardedFor;

/// A report that passed validation and may be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub device_id: DeviceId,
    pub status: DoorState,
    pub source: ForwardedFor,
}

impl StatusReport {
    /// Parse a raw request body. Firmware posts JSON as `text/plain`, so the
    /// body is decoded without looking at the content type.
    pub fn from_payload(body: &str, source: ForwardedFor) -> Result<Self, BridgeError> {
        let payload: StatusUpdatePayload = serde_json::from_str(body)
            .map_err(|e| BridgeError::InvalidData(format!("unparsable request body: {e}")))?;
        Self::from_parts(payload, source)
    }

    /// Validate `uid` first, then `statusUpdate`; the first failure wins.
    pub fn from_parts(payload: StatusUpdatePayload, source: ForwardedFor) -> Result<Self, BridgeError> {
        let device_id = validate_uid(payload.uid.as_ref())?;
        let status = parse_status(payload.status_update.as_ref())?;
        Ok(Self {
            device_id,
            status,
            source,
        })
    }
}

fn validate_uid(uid: Option<&Value>) -> Result<DeviceId, BridgeError> {
    match uid {
        Some(Value::String(raw)) => {
            DeviceId::parse(raw).map_err(|_| BridgeError::InvalidCredentials)
        }
        _ => Err(BridgeError::InvalidCredentials),
    }
}

/// Accept a JSON number or a numeric string (`"42"`, `" 01 "`).
pub fn parse_status(raw: Option<&Value>) -> Result<DoorState, BridgeError> {
    let number = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    let number = number.ok_or_else(|| {
        BridgeError::InvalidData(match raw {
            Some(v) => format!("statusUpdate {v} is not numeric"),
            None => "statusUpdate missing".to_string(),
        })
    })?;
    DoorState::from_number(number).map_err(|e| BridgeError::InvalidData(e.to_string()))
}

/// Handed back once the `doorState` write is acknowledged.
///
/// `tracker` is the detached reachability task; dropping the handle leaves it
/// running.
#[derive(Debug)]
pub struct IngestReceipt {
    pub device_id: DeviceId,
    pub door_state: DoorState,
    pub tracker: JoinHandle<()>,
}
