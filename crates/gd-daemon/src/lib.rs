//! Long-running bridge service: opens the device store, serves the device
//! and operator HTTP API, and shuts down gracefully.

pub mod daemon;
pub mod shutdown;
