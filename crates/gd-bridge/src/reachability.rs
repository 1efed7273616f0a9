//! Best-effort bookkeeping of where each device was last seen.
//!
//! Failures here are logged and counted, never returned to the device whose
//! report triggered the update.

use std::sync::Arc;

use gd_core::store::DeviceStore;
use gd_core::types::{DeviceId, ReachabilityUpdate};
use gd_telemetry::metrics::{global_metrics, REACHABILITY_UPDATES};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn, Instrument};

use crate::error::BridgeError;
use crate::forwarded::ForwardedFor;

#[derive(Clone)]
pub struct ReachabilityTracker {
    store: Arc<dyn DeviceStore>,
}

impl ReachabilityTracker {
    pub fn new(store: Arc<dyn DeviceStore>) -> Self {
        Self { store }
    }

    /// Record `remoteIPAddress` and `lastIPUpdate` for `device_id`.
    ///
    /// Returns the address that was written.
    pub async fn record(
        &self,
        device_id: &DeviceId,
        source: &ForwardedFor,
    ) -> Result<String, BridgeError> {
        let address = match source {
            ForwardedFor::Single(address) => address.clone(),
            ForwardedFor::Chain(hops) => match hops.first() {
                Some(first) => {
                    warn!(
                        device_id = %device_id,
                        hops = hops.len(),
                        address = %first,
                        "forwarding header carried multiple hops, recording the first"
                    );
                    first.clone()
                }
                None => return Err(self.reject(device_id, "empty address list".into())),
            },
            ForwardedFor::Unrecognized(what) => return Err(self.reject(device_id, what.clone())),
        };

        let update = ReachabilityUpdate::observed_now(address.clone());
        if let Err(e) = self.store.update_reachability(device_id, &update).await {
            error!(device_id = %device_id, address = %address, error = %e, "failed to update device remote address");
            global_metrics().increment_counter(REACHABILITY_UPDATES, &[("outcome", "store_write_failed")]);
            return Err(BridgeError::StoreWriteFailed(e));
        }

        debug!(device_id = %device_id, address = %address, "updated device remote address");
        global_metrics().increment_counter(REACHABILITY_UPDATES, &[("outcome", "ok")]);
        Ok(address)
    }

    /// Run [`Self::record`] as a detached task in the caller's span.
    pub fn spawn_record(&self, device_id: DeviceId, source: ForwardedFor) -> JoinHandle<()> {
        let tracker = self.clone();
        tokio::spawn(
            async move {
                // Outcome already logged inside `record`.
                let _ = tracker.record(&device_id, &source).await;
            }
            .in_current_span(),
        )
    }

    fn reject(&self, device_id: &DeviceId, what: String) -> BridgeError {
        error!(device_id = %device_id, forwarded_for = %what, "unknown address data, skipping remote address update");
        global_metrics().increment_counter(REACHABILITY_UPDATES, &[("outcome", "unknown_address_format")]);
        BridgeError::UnknownAddressFormat(what)
    }
}
