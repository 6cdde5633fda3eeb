//! Ingestion of the external append-only alert log.
//!
//! The log is a JSON array written by an out-of-scope detector process. A
//! missing file and malformed JSON both degrade to an empty record set; the
//! ingester never fails the sampling cycle.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use super::history::TelemetryHistory;

/// How many trailing records each ingestion considers
const INGEST_TAIL: usize = 10;

/// One record from the alert log, tolerant of missing fields.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertRecord {
    #[serde(default)]
    pub timestamp: Option<Epoch>,
    #[serde(default = "default_ip")]
    pub ip: String,
    #[serde(default)]
    pub reason: String,
}

fn default_ip() -> String {
    "N/A".to_string()
}

/// Epoch seconds as the detector writes them: a number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Epoch {
    Seconds(f64),
    Text(String),
}

impl Epoch {
    pub fn as_seconds(&self) -> Option<f64> {
        match self {
            Epoch::Seconds(s) => Some(*s),
            Epoch::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Reads the alert log and appends rendered lines to the bounded buffer.
pub struct AlertIngester {
    log_path: PathBuf,
}

impl AlertIngester {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
        }
    }

    /// One ingestion pass: format the last records in file order and append
    /// each line to the buffer unless the exact text is already present.
    ///
    /// Dedup is by rendered content, so two distinct records that render
    /// identically within the same second collapse into one line.
    /// Returns the newly appended lines.
    pub fn ingest(&self, history: &mut TelemetryHistory) -> Vec<String> {
        let records = self.read_records();
        let tail_start = records.len().saturating_sub(INGEST_TAIL);

        let mut added = Vec::new();
        for record in &records[tail_start..] {
            let line = format_alert_line(record);
            if !history.contains_alert(&line) {
                history.push_alert(line.clone());
                added.push(line);
            }
        }
        added
    }

    /// Newest-first records for the status view.
    pub fn latest_records(&self, limit: usize) -> Vec<AlertRecord> {
        let mut records = self.read_records();
        records.sort_by(|a, b| {
            let ta = a.timestamp.as_ref().and_then(Epoch::as_seconds).unwrap_or(0.0);
            let tb = b.timestamp.as_ref().and_then(Epoch::as_seconds).unwrap_or(0.0);
            tb.partial_cmp(&ta).unwrap_or(std::cmp::Ordering::Equal)
        });
        records.truncate(limit);
        records
    }

    fn read_records(&self) -> Vec<AlertRecord> {
        let raw = match fs::read_to_string(&self.log_path) {
            Ok(raw) => raw,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str::<Vec<AlertRecord>>(&raw) {
            Ok(records) => records,
            Err(e) => {
                log::debug!("alert log {} unreadable: {}", self.log_path.display(), e);
                Vec::new()
            }
        }
    }
}

/// Render one record as `[HH:MM:SS] <ip> - <reason>` in local wall-clock
/// time; a missing or unparseable timestamp renders as `N/A`.
pub fn format_alert_line(record: &AlertRecord) -> String {
    use chrono::{Local, TimeZone};

    let time = record
        .timestamp
        .as_ref()
        .and_then(Epoch::as_seconds)
        .and_then(|secs| Local.timestamp_opt(secs as i64, 0).single())
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "N/A".to_string());

    format!("[{}] {} - {}", time, record.ip, record.reason)
}
