//! One-shot status view: blocked-rule count and newest alerts.

use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;

use crate::core::config::Config;
use crate::core::firewall::{CommandRunner, FirewallManager, SystemRunner};
use crate::core::telemetry::{format_alert_line, AlertIngester};

const STATUS_ALERT_LIMIT: usize = 20;

pub fn execute(config: &Config) -> Result<()> {
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
    let mut manager = FirewallManager::new(runner, config.iptables_bin.clone());
    manager.refresh(true)?;

    println!(
        "{} {}",
        "Blocked sources in INPUT:".bold(),
        manager.blocked_count()
    );

    let ingester = AlertIngester::new(config.alert_log.clone());
    let latest = ingester.latest_records(STATUS_ALERT_LIMIT);
    if latest.is_empty() {
        println!("{}", "No alerts recorded.".dimmed());
    } else {
        println!("{}", "Latest alerts:".bold());
        for record in &latest {
            println!("  {}", format_alert_line(record).yellow());
        }
    }

    Ok(())
}
