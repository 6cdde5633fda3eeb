//! Plain-text rendering for the CLI.

use colored::Colorize;

use crate::core::firewall::{MutationOutcome, RuleEntry};
use crate::core::telemetry::TelemetrySnapshot;

pub fn print_rule_table(rules: &[RuleEntry]) {
    println!(
        "{:<10} {:>4} {:<8} {:<6} {:<4} {:<18} {:<18} {}",
        "CHAIN".bold(),
        "NO.".bold(),
        "TARGET".bold(),
        "PROT".bold(),
        "OPT".bold(),
        "SOURCE".bold(),
        "DESTINATION".bold(),
        "OPTIONS".bold()
    );

    if rules.is_empty() {
        println!("{}", "  (no rules)".dimmed());
        return;
    }

    for rule in rules {
        let target = match rule.target.as_str() {
            "DROP" | "REJECT" => rule.target.red().to_string(),
            "ACCEPT" => rule.target.green().to_string(),
            other => other.to_string(),
        };
        println!(
            "{:<10} {:>4} {:<8} {:<6} {:<4} {:<18} {:<18} {}",
            rule.chain,
            rule.number,
            target,
            rule.protocol,
            rule.opt,
            rule.source,
            rule.destination,
            rule.options
        );
    }
}

pub fn print_mutation_outcome(outcome: &MutationOutcome) {
    if outcome.success {
        println!("{} {}", "OK".green().bold(), outcome.message);
    } else {
        println!("{} {}", "FAILED".red().bold(), outcome.message);
    }
}

pub fn print_telemetry_snapshot(snapshot: &TelemetrySnapshot) {
    if let Some(latest) = snapshot.connections.last() {
        println!(
            "{} {} established",
            "Connections:".bold(),
            latest.established
        );
    } else {
        println!("{} {}", "Connections:".bold(), "no data yet".dimmed());
    }

    if let Some(latest) = snapshot.system.last() {
        println!(
            "{} CPU {:.1}%  RAM {:.1}%",
            "System:".bold(),
            latest.cpu_percent,
            latest.ram_percent
        );
    }

    if !snapshot.top_ips.is_empty() {
        println!("{}", "Top remote addresses:".bold());
        for (ip, count) in &snapshot.top_ips {
            println!("  {:<15} : {}", ip, count);
        }
    }

    if !snapshot.alerts.is_empty() {
        println!("{}", "Alerts:".bold());
        for line in snapshot.alerts.iter().rev().take(15) {
            println!("  {}", line.yellow());
        }
    }
}
