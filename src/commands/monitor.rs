//! Live monitor: telemetry snapshots plus the auto-refreshing rule table.
//!
//! The telemetry loop runs on its own background runtime; this command's
//! loop is the presentation side. It re-renders the rule table only when the
//! poller reports a change, so an unchanged table never flickers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;

use crate::core::config::Config;
use crate::core::firewall::{CommandRunner, FirewallManager, SystemRunner};
use crate::core::telemetry::TelemetryRuntime;
use crate::ui::formatters;

pub fn execute(config: &Config) -> Result<()> {
    let telemetry = TelemetryRuntime::start(config.telemetry())?;

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
    let mut manager = FirewallManager::new(runner, config.iptables_bin.clone());
    match manager.refresh(true) {
        Ok(_) => formatters::print_rule_table(manager.rules()),
        Err(e) => log::warn!("initial rule poll failed: {}", e),
    }

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        })?;
    }

    println!("{}", "Monitoring... press Ctrl-C to stop.".dimmed());

    let poll_interval = config.rule_poll_interval();
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(poll_interval);
        if !running.load(Ordering::SeqCst) {
            break;
        }

        println!();
        formatters::print_telemetry_snapshot(&telemetry.snapshot());

        if manager.auto_refresh() {
            println!("{}", "Rule table changed:".bold());
            formatters::print_rule_table(manager.rules());
        }
    }

    telemetry.shutdown();
    Ok(())
}
