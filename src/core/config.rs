use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::telemetry::TelemetryConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Packet-filter binary invoked for listing and mutation
    #[serde(default = "default_iptables_bin")]
    pub iptables_bin: String,
    /// Socket statistics binary invoked for connection sampling
    #[serde(default = "default_ss_bin")]
    pub ss_bin: String,
    /// JSON alert log written by the detector service
    #[serde(default = "default_alert_log")]
    pub alert_log: PathBuf,
    #[serde(default = "default_sample_interval")]
    pub sample_interval_secs: u64,
    #[serde(default = "default_rule_poll_interval")]
    pub rule_poll_interval_secs: u64,
    #[serde(default = "default_failure_backoff")]
    pub failure_backoff_secs: u64,
    #[serde(default = "default_top_ips")]
    pub top_ips: usize,
}

fn default_iptables_bin() -> String {
    "iptables".to_string()
}

fn default_ss_bin() -> String {
    "ss".to_string()
}

fn default_alert_log() -> PathBuf {
    PathBuf::from("/var/log/firewall_alerts.json")
}

fn default_sample_interval() -> u64 {
    2
}

fn default_rule_poll_interval() -> u64 {
    3
}

fn default_failure_backoff() -> u64 {
    30
}

fn default_top_ips() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            iptables_bin: default_iptables_bin(),
            ss_bin: default_ss_bin(),
            alert_log: default_alert_log(),
            sample_interval_secs: default_sample_interval(),
            rule_poll_interval_secs: default_rule_poll_interval(),
            failure_backoff_secs: default_failure_backoff(),
            top_ips: default_top_ips(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let data = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        // An empty or corrupted file degrades to defaults
        if data.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_json::from_str(&data).unwrap_or_default())
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        fs::write(&config_path, data)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("fwatch").join("config.json"))
    }

    /// Telemetry runtime settings derived from this config.
    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            ss_bin: self.ss_bin.clone(),
            alert_log: self.alert_log.clone(),
            sample_interval: Duration::from_secs(self.sample_interval_secs.max(1)),
            failure_backoff: Duration::from_secs(self.failure_backoff_secs.max(1)),
            top_ips: self.top_ips,
        }
    }

    pub fn rule_poll_interval(&self) -> Duration {
        Duration::from_secs(self.rule_poll_interval_secs.max(1))
    }
}
