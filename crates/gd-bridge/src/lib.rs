//! Control-plane bridge between door-actuator devices and the device store.
//!
//! A device report flows through [`ingest`] (validation and the authoritative
//! `doorState` write), then [`reachability`] records the address it arrived
//! from as a detached task. [`dispatcher`] sends commands back to a device's
//! last known address. [`bridge::Bridge`] composes the three around an
//! injected [`gd_core::store::DeviceStore`], and [`http_api`] exposes it.

pub mod bridge;
pub mod dispatcher;
pub mod error;
pub mod forwarded;
pub mod http_api;
pub mod ingest;
pub mod reachability;

pub use bridge::Bridge;
pub use error::BridgeError;
