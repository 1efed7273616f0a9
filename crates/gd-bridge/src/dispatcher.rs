//! Outbound commands to a device's embedded web server.
//!
//! One GET per command, no retry. Each request is bounded by the configured
//! timeout, and a semaphore caps how many commands are in flight at once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gd_core::config::DispatchConfig;
use gd_core::types::{DeviceId, DoorCommand};
use gd_telemetry::metrics::{global_metrics, COMMANDS_DISPATCHED, COMMAND_DURATION};
use reqwest::StatusCode;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::error::BridgeError;

/// Everything needed to address one command at one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub device_id: DeviceId,
    pub target_address: String,
    pub target_port: u16,
    pub command: DoorCommand,
}

impl CommandRequest {
    pub fn url(&self) -> String {
        command_url(
            &self.target_address,
            self.target_port,
            &self.device_id,
            self.command,
        )
    }
}

/// `http://{address}:{port}/{device_id}/{command path}`.
///
/// The command path keeps its own leading slash, so the URL carries `//`
/// between the id and the command, which is what deployed firmware expects.
/// Bare IPv6 literals are bracketed. The device id is percent-encoded so a
/// `#`, `?` or `/` in it cannot truncate or redirect the command path.
pub fn command_url(address: &str, port: u16, device_id: &DeviceId, command: DoorCommand) -> String {
    let host = if address.contains(':') && !address.starts_with('[') {
        format!("[{address}]")
    } else {
        address.to_string()
    };
    let id = urlencoding::encode(device_id.as_str());
    format!("http://{host}:{port}/{id}/{}", command.path())
}

/// The device answered the command with HTTP 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledged {
    pub url: String,
}

#[derive(Clone)]
pub struct CommandDispatcher {
    client: reqwest::Client,
    permits: Arc<Semaphore>,
}

impl CommandDispatcher {
    pub fn new(config: &DispatchConfig) -> Result<Self, BridgeError> {
        Self::with_limits(
            Duration::from_secs(config.timeout_secs),
            config.max_in_flight,
        )
    }

    pub fn with_limits(timeout: Duration, max_in_flight: usize) -> Result<Self, BridgeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::DispatchFailed(format!("building HTTP client: {e}")))?;
        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        })
    }

    /// Send one command. `Ok` only when the device replies with exactly 200.
    pub async fn send_command(&self, request: &CommandRequest) -> Result<Acknowledged, BridgeError> {
        let url = request.url();
        let command = request.command.name();

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| BridgeError::DispatchFailed("dispatcher is shut down".into()))?;

        let started = Instant::now();
        let outcome = self.client.get(&url).send().await;
        global_metrics().record_duration(COMMAND_DURATION, started.elapsed().as_secs_f64());

        let result = match outcome {
            Ok(resp) if resp.status() == StatusCode::OK => {
                info!(device_id = %request.device_id, command, url = %url, "device acknowledged command");
                Ok(Acknowledged { url })
            }
            Ok(resp) => {
                warn!(device_id = %request.device_id, command, url = %url, status = %resp.status(), "device rejected command");
                Err(BridgeError::DispatchFailed(format!(
                    "{url} answered HTTP {}",
                    resp.status().as_u16()
                )))
            }
            Err(e) => {
                let kind = if e.is_timeout() {
                    "timed out"
                } else if e.is_connect() {
                    "connection failed"
                } else {
                    "transport error"
                };
                warn!(device_id = %request.device_id, command, url = %url, error = %e, "failed to send command to device");
                Err(BridgeError::DispatchFailed(format!("{url} {kind}: {e}")))
            }
        };

        let outcome = if result.is_ok() { "ok" } else { "failed" };
        global_metrics().increment_counter(
            COMMANDS_DISPATCHED,
            &[("command", command), ("outcome", outcome)],
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(c: char) -> DeviceId {
        DeviceId::parse(&c.to_string().repeat(28)).unwrap()
    }

    #[test]
    fn actuate_url_keeps_double_slash() {
        let url = command_url("192.168.1.5", 8080, &device('A'), DoorCommand::ActuateDoor);
        assert_eq!(
            url,
            "http://192.168.1.5:8080/AAAAAAAAAAAAAAAAAAAAAAAAAAAA//ActuateDoor"
        );
    }

    #[test]
    fn every_command_path() {
        let id = device('B');
        let base = format!("http://10.0.0.2:80/{id}/");
        for (cmd, tail) in [
            (DoorCommand::ActuateDoor, "/ActuateDoor"),
            (DoorCommand::HealthCheck, "/HealthCheck"),
            (DoorCommand::ForceHealthCheck, "/ForceHealthCheck"),
            (DoorCommand::ForceDoorStatusCheck, "/ForceDoorStatusCheck"),
        ] {
            assert_eq!(command_url("10.0.0.2", 80, &id, cmd), format!("{base}{tail}"));
        }
    }

    #[test]
    fn ipv6_literal_is_bracketed() {
        let url = command_url("2001:db8::1", 80, &device('C'), DoorCommand::HealthCheck);
        assert!(url.starts_with("http://[2001:db8::1]:80/"));
        let url = command_url("[2001:db8::1]", 80, &device('C'), DoorCommand::HealthCheck);
        assert!(url.starts_with("http://[2001:db8::1]:80/"));
    }

    #[test]
    fn request_url_matches_free_function() {
        let req = CommandRequest {
            device_id: device('D'),
            target_address: "192.0.2.10".into(),
            target_port: 8266,
            command: DoorCommand::ForceDoorStatusCheck,
        };
        assert_eq!(
            req.url(),
            command_url("192.0.2.10", 8266, &device('D'), DoorCommand::ForceDoorStatusCheck)
        );
    }

    #[test]
    fn device_id_is_percent_encoded() {
        let id = DeviceId::parse("abc#def?ghi/jkl mnopqrstuvwx").unwrap();
        let url = command_url("10.0.0.2", 80, &id, DoorCommand::ActuateDoor);
        assert_eq!(
            url,
            "http://10.0.0.2:80/abc%23def%3Fghi%2Fjkl%20mnopqrstuvwx//ActuateDoor"
        );
    }
}
