//! Domain model, persistence and configuration for the garage-door bridge.
//!
//! - [`types`]: device identifiers, door state codes, command kinds and the
//!   persisted [`types::DeviceRecord`]
//! - [`store`]: the [`store::DeviceStore`] capability and its in-memory backend
//! - [`device_db`]: SQLite-backed [`store::DeviceStore`]
//! - [`config`]: TOML configuration for the daemon

pub mod config;
pub mod device_db;
pub mod store;
pub mod types;
