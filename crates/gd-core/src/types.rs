use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of a device identifier issued by the identity provider.
pub const DEVICE_ID_LEN: usize = 28;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("device id must be exactly {DEVICE_ID_LEN} characters, got {0}")]
    InvalidDeviceId(usize),
    #[error("door state {0} is outside 0..=100")]
    DoorStateOutOfRange(String),
    #[error("unknown door command: {0}")]
    UnknownCommand(String),
}

// ---------------------------------------------------------------------------
// DeviceId
// ---------------------------------------------------------------------------

/// Opaque 28-character identifier of a device/owner pairing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let len = raw.chars().count();
        if len != DEVICE_ID_LEN {
            return Err(CoreError::InvalidDeviceId(len));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// DoorState
// ---------------------------------------------------------------------------

/// Numeric door status code reported by a device, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DoorState(u8);

impl DoorState {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 100;

    pub fn new(code: u8) -> Result<Self, CoreError> {
        if code > Self::MAX {
            return Err(CoreError::DoorStateOutOfRange(code.to_string()));
        }
        Ok(Self(code))
    }

    /// Accept a decoded JSON number. Fractional, non-finite and out-of-range
    /// values are rejected.
    pub fn from_number(value: f64) -> Result<Self, CoreError> {
        if !value.is_finite()
            || value.fract() != 0.0
            || value < f64::from(Self::MIN)
            || value > f64::from(Self::MAX)
        {
            return Err(CoreError::DoorStateOutOfRange(value.to_string()));
        }
        Ok(Self(value as u8))
    }

    pub fn code(self) -> u8 {
        self.0
    }

    /// Position for the codes the firmware actually emits; other codes are
    /// accepted and stored but carry no defined meaning.
    pub fn position(self) -> Option<DoorPosition> {
        match self.0 {
            0 => Some(DoorPosition::Open),
            1 => Some(DoorPosition::Closed),
            _ => None,
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for DoorState {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DoorState> for u8 {
    fn from(state: DoorState) -> Self {
        state.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorPosition {
    Open,
    Closed,
}

// ---------------------------------------------------------------------------
// DoorCommand
// ---------------------------------------------------------------------------

/// Commands a device's embedded web server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DoorCommand {
    ActuateDoor,
    HealthCheck,
    ForceHealthCheck,
    ForceDoorStatusCheck,
}

impl DoorCommand {
    pub const ALL: [DoorCommand; 4] = [
        DoorCommand::ActuateDoor,
        DoorCommand::HealthCheck,
        DoorCommand::ForceHealthCheck,
        DoorCommand::ForceDoorStatusCheck,
    ];

    /// Fixed path constant appended after the device id. The leading slash is
    /// part of the constant.
    pub fn path(self) -> &'static str {
        match self {
            DoorCommand::ActuateDoor => "/ActuateDoor",
            DoorCommand::HealthCheck => "/HealthCheck",
            DoorCommand::ForceHealthCheck => "/ForceHealthCheck",
            DoorCommand::ForceDoorStatusCheck => "/ForceDoorStatusCheck",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DoorCommand::ActuateDoor => "actuate-door",
            DoorCommand::HealthCheck => "health-check",
            DoorCommand::ForceHealthCheck => "force-health-check",
            DoorCommand::ForceDoorStatusCheck => "force-door-status-check",
        }
    }
}

impl fmt::Display for DoorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DoorCommand {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bare = trimmed.trim_start_matches('/');
        DoorCommand::ALL
            .into_iter()
            .find(|cmd| cmd.name() == trimmed || &cmd.path()[1..] == bare)
            .ok_or_else(|| CoreError::UnknownCommand(trimmed.to_string()))
    }
}

// ---------------------------------------------------------------------------
// DeviceRecord
// ---------------------------------------------------------------------------

/// Persisted state of one device, keyed by [`DeviceId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub id: DeviceId,
    pub door_state: Option<DoorState>,
    #[serde(rename = "remoteIPAddress")]
    pub remote_ip_address: Option<String>,
    #[serde(rename = "lastIPUpdate")]
    pub last_ip_update: Option<i64>,
}

impl DeviceRecord {
    pub fn new(id: DeviceId) -> Self {
        Self {
            id,
            door_state: None,
            remote_ip_address: None,
            last_ip_update: None,
        }
    }
}

/// Address observation written as a single pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachabilityUpdate {
    pub remote_ip_address: String,
    /// Milliseconds since the Unix epoch.
    pub last_ip_update: i64,
}

impl ReachabilityUpdate {
    /// Stamp an observed address with the current time.
    pub fn observed_now(address: impl Into<String>) -> Self {
        Self {
            remote_ip_address: address.into(),
            last_ip_update: chrono::Utc::now().timestamp_millis(),
        }
    }
}
