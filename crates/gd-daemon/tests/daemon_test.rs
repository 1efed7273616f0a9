//! Daemon lifecycle: store selection, serving, graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use gd_core::config::{Config, StoreBackend};
use gd_core::store::MemoryDeviceStore;
use gd_daemon::daemon::Daemon;
use serde_json::{json, Value};

const UID: &str = "2XsXatJ4DgdltTMcIcrC146aUNZ2";

/// Start the daemon on an ephemeral port; returns the base URL and the
/// task running it.
async fn start(daemon: Arc<Daemon>) -> (String, tokio::task::JoinHandle<anyhow::Result<()>>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind to ephemeral port");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move { daemon.run_with_listener(listener).await });
    (format!("http://{addr}"), handle)
}

fn memory_config() -> Config {
    let mut config = Config::default();
    config.store.backend = StoreBackend::Memory;
    config
}

#[tokio::test]
async fn serves_status_and_shuts_down() {
    let daemon = Arc::new(Daemon::new(memory_config()).await.unwrap());
    let shutdown = daemon.shutdown_handle();
    let (base, handle) = start(daemon).await;

    let status: Value = reqwest::get(format!("{base}/api/status"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["device_count"], 0);

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("daemon should stop after shutdown")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn accepts_device_reports() {
    let store = Arc::new(MemoryDeviceStore::new());
    let daemon = Arc::new(Daemon::with_store(memory_config(), store).unwrap());
    let (base, _handle) = start(daemon.clone()).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/doorStatusUpdate"))
        .header("X-Forwarded-For", "198.51.100.20")
        .body(json!({"statusUpdate": "1", "uid": UID}).to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.json::<Value>().await.unwrap()["result"], "OK");

    let devices = daemon.api_state().bridge.devices().await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].door_state.map(|s| s.code()), Some(1));

    daemon.shutdown();
}

#[tokio::test]
async fn configured_body_limit_is_applied() {
    let mut config = memory_config();
    config.server.body_limit_bytes = 64;
    let daemon = Arc::new(Daemon::new(config).await.unwrap());
    let (base, _handle) = start(daemon.clone()).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/doorStatusUpdate"))
        .body("x".repeat(65))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);

    daemon.shutdown();
}

#[tokio::test]
async fn opens_sqlite_store_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("devices.db");

    let mut config = Config::default();
    config.store.backend = StoreBackend::Sqlite;
    config.store.path = path.to_string_lossy().into_owned();

    let daemon = Daemon::new(config).await.unwrap();
    assert!(path.exists());
    assert!(daemon.api_state().bridge.devices().await.unwrap().is_empty());
}
