//! Rule listing and mutation subcommands.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::ArgMatches;

use crate::core::config::Config;
use crate::core::firewall::{
    AddRule, CommandRunner, FirewallManager, RuleProtocol, RuleTarget, SystemRunner,
};
use crate::ui::formatters;

fn manager(config: &Config) -> FirewallManager {
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
    FirewallManager::new(runner, config.iptables_bin.clone())
}

pub fn list(config: &Config) -> Result<()> {
    let mut manager = manager(config);
    manager.refresh(true)?;
    formatters::print_rule_table(manager.rules());
    Ok(())
}

pub fn add(config: &Config, matches: &ArgMatches) -> Result<()> {
    let target: RuleTarget = matches
        .get_one::<String>("target")
        .expect("target is required")
        .parse()?;
    let protocol: RuleProtocol = matches
        .get_one::<String>("protocol")
        .expect("protocol has a default")
        .parse()?;

    let rule = AddRule {
        chain: matches
            .get_one::<String>("chain")
            .expect("chain has a default")
            .clone(),
        target,
        protocol,
        source: matches.get_one::<String>("source").cloned(),
        dest_port: matches.get_one::<String>("dport").cloned(),
    };

    let mut manager = manager(config);
    let outcome = manager.add_rule(&rule)?;
    formatters::print_mutation_outcome(&outcome);
    if outcome.success {
        formatters::print_rule_table(manager.rules());
    }
    Ok(())
}

pub fn delete(config: &Config, matches: &ArgMatches) -> Result<()> {
    let chain = matches
        .get_one::<String>("chain")
        .expect("chain is required");
    let number: u32 = matches
        .get_one::<String>("number")
        .expect("number is required")
        .parse()
        .map_err(|_| anyhow!("rule number must be a positive integer"))?;

    let mut manager = manager(config);
    let outcome = manager.delete_rule(chain, number)?;
    formatters::print_mutation_outcome(&outcome);
    Ok(())
}

pub fn block(config: &Config, matches: &ArgMatches) -> Result<()> {
    let ip = matches.get_one::<String>("ip").expect("ip is required");
    let mut manager = manager(config);
    let outcome = manager.block_ip(ip)?;
    formatters::print_mutation_outcome(&outcome);
    Ok(())
}

pub fn unblock(config: &Config, matches: &ArgMatches) -> Result<()> {
    let ip = matches.get_one::<String>("ip").expect("ip is required");
    let mut manager = manager(config);
    let outcome = manager.unblock_ip(ip)?;
    formatters::print_mutation_outcome(&outcome);
    Ok(())
}
