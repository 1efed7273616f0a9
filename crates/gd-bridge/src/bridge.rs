use std::sync::Arc;

use gd_core::config::DispatchConfig;
use gd_core::store::DeviceStore;
use gd_core::types::{DeviceId, DeviceRecord, DoorCommand};
use gd_telemetry::metrics::{global_metrics, STATUS_UPDATES};
use tracing::{error, info, warn};

use crate::dispatcher::{Acknowledged, CommandDispatcher, CommandRequest};
use crate::error::BridgeError;
use crate::forwarded::ForwardedFor;
use crate::ingest::{IngestReceipt, StatusReport};
use crate::reachability::ReachabilityTracker;

/// Status ingest, reachability tracking and command dispatch around one
/// injected store.
pub struct Bridge {
    store: Arc<dyn DeviceStore>,
    tracker: ReachabilityTracker,
    dispatcher: CommandDispatcher,
    default_port: u16,
}

impl Bridge {
    pub fn new(store: Arc<dyn DeviceStore>, dispatch: &DispatchConfig) -> Result<Self, BridgeError> {
        let dispatcher = CommandDispatcher::new(dispatch)?;
        Ok(Self::with_dispatcher(store, dispatcher, dispatch.device_port))
    }

    pub fn with_dispatcher(
        store: Arc<dyn DeviceStore>,
        dispatcher: CommandDispatcher,
        default_port: u16,
    ) -> Self {
        Self {
            tracker: ReachabilityTracker::new(store.clone()),
            store,
            dispatcher,
            default_port,
        }
    }

    pub fn store(&self) -> &Arc<dyn DeviceStore> {
        &self.store
    }

    pub fn tracker(&self) -> &ReachabilityTracker {
        &self.tracker
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    // -----------------------------------------------------------------------
    // Status ingest
    // -----------------------------------------------------------------------

    /// Validate a raw report body and ingest it. Validation failures are
    /// logged here and never touch the store.
    pub async fn handle_status_payload(
        &self,
        body: &str,
        source: ForwardedFor,
    ) -> Result<IngestReceipt, BridgeError> {
        let report = match StatusReport::from_payload(body, source) {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, body = %body, "rejected door status update");
                global_metrics().increment_counter(STATUS_UPDATES, &[("outcome", e.kind())]);
                return Err(e);
            }
        };
        self.ingest_status(report).await
    }

    /// Write `doorState` and, once the store acknowledges, start the
    /// reachability update in the background.
    pub async fn ingest_status(&self, report: StatusReport) -> Result<IngestReceipt, BridgeError> {
        let StatusReport {
            device_id,
            status,
            source,
        } = report;

        if let Err(e) = self.store.set_door_state(&device_id, status).await {
            error!(device_id = %device_id, status = %status, error = %e, "failed to update door status for valid request");
            global_metrics().increment_counter(STATUS_UPDATES, &[("outcome", "store_write_failed")]);
            return Err(BridgeError::StoreWriteFailed(e));
        }

        info!(device_id = %device_id, status = %status, position = ?status.position(), "updated door status");
        global_metrics().increment_counter(STATUS_UPDATES, &[("outcome", "ok")]);

        let tracker = self.tracker.spawn_record(device_id.clone(), source);
        Ok(IngestReceipt {
            device_id,
            door_state: status,
            tracker,
        })
    }

    // -----------------------------------------------------------------------
    // Command dispatch
    // -----------------------------------------------------------------------

    pub async fn send_command(&self, request: &CommandRequest) -> Result<Acknowledged, BridgeError> {
        self.dispatcher.send_command(request).await
    }

    /// Command a device at its last recorded address unless `address` is
    /// given; `port` falls back to the configured device port.
    pub async fn dispatch_to_device(
        &self,
        device_id: &DeviceId,
        command: DoorCommand,
        address: Option<String>,
        port: Option<u16>,
    ) -> Result<Acknowledged, BridgeError> {
        let target_address = match address {
            Some(address) => address,
            None => self
                .device(device_id)
                .await?
                .remote_ip_address
                .ok_or_else(|| BridgeError::AddressUnknown(device_id.to_string()))?,
        };
        let request = CommandRequest {
            device_id: device_id.clone(),
            target_address,
            target_port: port.unwrap_or(self.default_port),
            command,
        };
        self.send_command(&request).await
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn device(&self, device_id: &DeviceId) -> Result<DeviceRecord, BridgeError> {
        self.store
            .get_device(device_id)
            .await
            .map_err(BridgeError::Store)?
            .ok_or_else(|| BridgeError::DeviceNotFound(device_id.to_string()))
    }

    pub async fn devices(&self) -> Result<Vec<DeviceRecord>, BridgeError> {
        self.store.list_devices().await.map_err(BridgeError::Store)
    }
}
