//! The persistent-store capability the bridge is built on.
//!
//! Writes are upserts keyed by device id with last-write-wins semantics.
//! Neither backend offers compare-and-set or version tokens.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::types::{DeviceId, DeviceRecord, DoorState, ReachabilityUpdate};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The backend rejected the operation or could not be reached.
    #[error("store backend error: {0}")]
    Backend(String),
    /// A persisted row could not be mapped back into a [`DeviceRecord`].
    #[error("corrupt device record: {0}")]
    Corrupt(String),
}

impl From<tokio_rusqlite::Error> for StoreError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// DeviceStore
// ---------------------------------------------------------------------------

/// Key-addressable device state with partial-field updates.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn get_device(&self, id: &DeviceId) -> Result<Option<DeviceRecord>, StoreError>;

    async fn list_devices(&self) -> Result<Vec<DeviceRecord>, StoreError>;

    /// Overwrite `doorState`, creating the record if needed. Address fields
    /// are left untouched.
    async fn set_door_state(&self, id: &DeviceId, state: DoorState) -> Result<(), StoreError>;

    /// Write `remoteIPAddress` and `lastIPUpdate` together, creating the
    /// record if needed.
    async fn update_reachability(
        &self,
        id: &DeviceId,
        update: &ReachabilityUpdate,
    ) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// MemoryDeviceStore
// ---------------------------------------------------------------------------

/// Process-local store, used by tests and the `memory` backend.
#[derive(Debug, Default)]
pub struct MemoryDeviceStore {
    devices: RwLock<HashMap<DeviceId, DeviceRecord>>,
}

impl MemoryDeviceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceStore for MemoryDeviceStore {
    async fn get_device(&self, id: &DeviceId) -> Result<Option<DeviceRecord>, StoreError> {
        Ok(self.devices.read().await.get(id).cloned())
    }

    async fn list_devices(&self) -> Result<Vec<DeviceRecord>, StoreError> {
        let mut devices: Vec<DeviceRecord> =
            self.devices.read().await.values().cloned().collect();
        devices.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(devices)
    }

    async fn set_door_state(&self, id: &DeviceId, state: DoorState) -> Result<(), StoreError> {
        let mut devices = self.devices.write().await;
        devices
            .entry(id.clone())
            .or_insert_with(|| DeviceRecord::new(id.clone()))
            .door_state = Some(state);
        Ok(())
    }

    async fn update_reachability(
        &self,
        id: &DeviceId,
        update: &ReachabilityUpdate,
    ) -> Result<(), StoreError> {
        let mut devices = self.devices.write().await;
        let record = devices
            .entry(id.clone())
            .or_insert_with(|| DeviceRecord::new(id.clone()));
        record.remote_ip_address = Some(update.remote_ip_address.clone());
        record.last_ip_update = Some(update.last_ip_update);
        Ok(())
    }
}
