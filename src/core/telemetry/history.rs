//! Bounded ring buffers for the telemetry time series and alert lines.

use std::collections::{HashMap, VecDeque};

use super::metrics::{ConnectionSample, SystemSample, TelemetrySnapshot};

pub const CONNECTION_HISTORY: usize = 60;
pub const SYSTEM_HISTORY: usize = 60;
pub const ALERT_HISTORY: usize = 50;

/// Fixed-capacity history owned exclusively by the sampling loop.
///
/// Inserting past capacity evicts the oldest element first. The per-IP tally
/// is not a ring: it is replaced wholesale each sampling cycle.
#[derive(Debug, Clone)]
pub struct TelemetryHistory {
    connections: VecDeque<ConnectionSample>,
    system: VecDeque<SystemSample>,
    alerts: VecDeque<String>,
    ip_tally: HashMap<String, u64>,
}

impl TelemetryHistory {
    pub fn new() -> Self {
        Self {
            connections: VecDeque::with_capacity(CONNECTION_HISTORY),
            system: VecDeque::with_capacity(SYSTEM_HISTORY),
            alerts: VecDeque::with_capacity(ALERT_HISTORY),
            ip_tally: HashMap::new(),
        }
    }

    pub fn push_connection(&mut self, sample: ConnectionSample) {
        Self::push_value(&mut self.connections, sample, CONNECTION_HISTORY);
    }

    pub fn push_system(&mut self, sample: SystemSample) {
        Self::push_value(&mut self.system, sample, SYSTEM_HISTORY);
    }

    pub fn push_alert(&mut self, line: String) {
        Self::push_value(&mut self.alerts, line, ALERT_HISTORY);
    }

    /// Exact-text membership check used for alert deduplication (O(n) over a
    /// buffer of at most ALERT_HISTORY lines)
    pub fn contains_alert(&self, line: &str) -> bool {
        self.alerts.iter().any(|existing| existing == line)
    }

    /// Replace the per-IP tally with this cycle's freshly built mapping.
    pub fn set_tally(&mut self, tally: HashMap<String, u64>) {
        self.ip_tally = tally;
    }

    pub fn connection_len(&self) -> usize {
        self.connections.len()
    }

    pub fn system_len(&self) -> usize {
        self.system.len()
    }

    pub fn alert_len(&self) -> usize {
        self.alerts.len()
    }

    /// Build an immutable snapshot for consumers.
    pub fn snapshot(&self, top_n: usize) -> TelemetrySnapshot {
        let mut top_ips: Vec<(String, u64)> = self
            .ip_tally
            .iter()
            .map(|(ip, count)| (ip.clone(), *count))
            .collect();
        top_ips.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_ips.truncate(top_n);

        TelemetrySnapshot {
            timestamp: chrono::Utc::now().timestamp(),
            connections: self.connections.iter().copied().collect(),
            system: self.system.iter().copied().collect(),
            top_ips,
            alerts: self.alerts.iter().cloned().collect(),
        }
    }

    fn push_value<T>(queue: &mut VecDeque<T>, value: T, capacity: usize) {
        if queue.len() >= capacity {
            queue.pop_front();
        }
        queue.push_back(value);
    }
}

impl Default for TelemetryHistory {
    fn default() -> Self {
        Self::new()
    }
}
