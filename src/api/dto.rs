//! Data Transfer Objects
//!
//! Response types for the service endpoints that are not part of the relay
//! core.

use serde::Serialize;

/// Full health status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy"
    pub status: String,
    /// Broadcast backend: "local" or "service"
    pub broadcast: String,
    /// Channel deliveries are published to
    pub channel: String,
    /// WebSocket clients connected to the local hub
    pub connections: usize,
    pub uptime_seconds: u64,
    pub version: String,
}
