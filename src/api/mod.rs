//! HTTP API Module
//!
//! WebSocket event channel for dashboards plus health, status and metrics
//! endpoints.

mod routes;
mod metrics;

pub use routes::{router, run_api_server, ApiState};
pub use metrics::Metrics;
