use serde::{Deserialize, Serialize};

/// One point in the established-connection time series
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ConnectionSample {
    pub timestamp: i64, // Unix timestamp
    pub established: u64,
}

/// One point in the resource-usage time series
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SystemSample {
    pub timestamp: i64,
    pub cpu_percent: f32,
    pub ram_percent: f32,
}

/// Immutable telemetry snapshot handed to the presentation layer.
///
/// Consumers only ever see copies of the collector-owned buffers; they never
/// touch live collector state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub timestamp: i64,
    pub connections: Vec<ConnectionSample>,
    pub system: Vec<SystemSample>,
    /// Top-N remote addresses by connection count, count-descending
    pub top_ips: Vec<(String, u64)>,
    pub alerts: Vec<String>,
}
