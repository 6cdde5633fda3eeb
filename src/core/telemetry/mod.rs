//! Continuously-running telemetry collection.
//!
//! Bridges slow, text-based external sources (socket statistics, the
//! resource provider, the alert log) into bounded, presentation-ready state.

pub mod alerts;
pub mod connections;
pub mod history;
pub mod metrics;
pub mod runtime;
pub mod system;

pub use alerts::{format_alert_line, AlertIngester, AlertRecord, Epoch};
pub use connections::{
    count_established, is_tallyable_ip, normalize_remote_addr, tally_remote_addresses,
    ConnectionSampler,
};
pub use history::{TelemetryHistory, ALERT_HISTORY, CONNECTION_HISTORY, SYSTEM_HISTORY};
pub use metrics::{ConnectionSample, SystemSample, TelemetrySnapshot};
pub use runtime::{TelemetryConfig, TelemetryRuntime};
pub use system::ResourceSampler;
