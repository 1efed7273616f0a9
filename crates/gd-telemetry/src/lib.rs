//! Observability for the door bridge: log initialisation, a process-wide
//! metrics registry with Prometheus export, and axum middleware that tags
//! each request with an id and records request metrics.

pub mod logging;
pub mod metrics;
pub mod middleware;
