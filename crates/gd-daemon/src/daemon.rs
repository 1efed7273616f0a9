use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use gd_bridge::http_api::{api_router_with_limit, ApiState};
use gd_bridge::Bridge;
use gd_core::config::{Config, StoreBackend};
use gd_core::device_db::SqliteDeviceStore;
use gd_core::store::{DeviceStore, MemoryDeviceStore};
use tracing::info;

use crate::shutdown::ShutdownSignal;

/// The bridge service: one store, one HTTP listener, graceful shutdown.
pub struct Daemon {
    config: Config,
    api_state: Arc<ApiState>,
    shutdown: ShutdownSignal,
}

impl Daemon {
    /// Create a daemon around an already-opened store.
    pub fn with_store(config: Config, store: Arc<dyn DeviceStore>) -> Result<Self> {
        let bridge = Bridge::new(store, &config.dispatch).context("failed to build bridge")?;
        Ok(Self {
            api_state: Arc::new(ApiState::new(Arc::new(bridge))),
            config,
            shutdown: ShutdownSignal::new(),
        })
    }

    /// Create a daemon, opening the store named by `config.store`.
    pub async fn new(config: Config) -> Result<Self> {
        let store = open_store(&config).await?;
        Self::with_store(config, store)
    }

    pub fn shutdown_handle(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }

    pub fn api_state(&self) -> &Arc<ApiState> {
        &self.api_state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Bind `server.host:server.port` and serve until shutdown.
    pub async fn run(&self) -> Result<()> {
        let bind_addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("failed to bind {bind_addr}"))?;
        self.run_with_listener(listener).await
    }

    /// Serve on an already-bound listener until shutdown is triggered.
    /// In-flight requests are allowed to finish.
    pub async fn run_with_listener(&self, listener: tokio::net::TcpListener) -> Result<()> {
        let router = api_router_with_limit(
            self.api_state.clone(),
            self.config.server.body_limit_bytes,
        );
        let bind_addr = listener.local_addr()?;
        info!(%bind_addr, "API server listening");

        let shutdown = self.shutdown.clone();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await
            .context("API server error")?;

        info!("API server stopped");
        Ok(())
    }
}

async fn open_store(config: &Config) -> Result<Arc<dyn DeviceStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            info!("using in-memory device store");
            Ok(Arc::new(MemoryDeviceStore::new()))
        }
        StoreBackend::Sqlite => {
            let path = config.store.resolved_path();
            if let Some(parent) = Path::new(&path).parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let store = SqliteDeviceStore::new(&path)
                .await
                .with_context(|| format!("failed to open device database at {path}"))?;
            info!(path = %path, "opened device database");
            Ok(Arc::new(store))
        }
    }
}
