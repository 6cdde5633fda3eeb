//! Packet-filter rule table: listing, change-detected polling, and validated
//! mutation.

pub mod exec;
pub mod mutation;
pub mod parser;
pub mod snapshot;

pub use exec::{CommandOutput, CommandRunner, SystemRunner};
pub use mutation::{
    is_strict_ipv4, AddRule, MutationOutcome, RuleProtocol, RuleTarget,
};
pub use parser::{parse_listing, RuleEntry};
pub use snapshot::RulePoller;

use std::sync::Arc;

use crate::error::{FwatchError, Result};

/// Owns the snapshot poller and performs validated mutations against the
/// external tool.
///
/// Mutations are direct, user-triggered, blocking calls; `&mut self` keeps
/// them serialized within one process. A successful mutation invalidates the
/// snapshot cache and force-polls so the next read reflects it.
pub struct FirewallManager {
    runner: Arc<dyn CommandRunner>,
    iptables_bin: String,
    poller: RulePoller,
}

impl FirewallManager {
    pub fn new(runner: Arc<dyn CommandRunner>, iptables_bin: impl Into<String>) -> Self {
        let iptables_bin = iptables_bin.into();
        let poller = RulePoller::new(runner.clone(), iptables_bin.clone());
        Self {
            runner,
            iptables_bin,
            poller,
        }
    }

    /// Current structured table, as of the most recent successful poll.
    pub fn rules(&self) -> &[RuleEntry] {
        self.poller.table()
    }

    /// Fetch the listing; `force` bypasses the anti-flicker cache.
    pub fn refresh(&mut self, force: bool) -> Result<bool> {
        self.poller.poll(force)
    }

    /// Automatic-mode refresh: skipped when toggled off, failures swallowed.
    pub fn auto_refresh(&mut self) -> bool {
        self.poller.auto_poll()
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.poller.set_auto_enabled(enabled);
    }

    /// Append a rule to the end of the named chain.
    pub fn add_rule(&mut self, rule: &AddRule) -> Result<MutationOutcome> {
        let args = mutation::build_add_args(rule)?;
        self.execute_mutation(args, format!("Appended rule to {}", rule.chain))
    }

    /// Delete by chain and positional number from the latest snapshot.
    pub fn delete_rule(&mut self, chain: &str, number: u32) -> Result<MutationOutcome> {
        let args = mutation::build_delete_args(chain, number)?;
        self.execute_mutation(args, format!("Deleted rule #{} from {}", number, chain))
    }

    /// Insert a DROP for the source IP at the head of INPUT.
    pub fn block_ip(&mut self, ip: &str) -> Result<MutationOutcome> {
        validate_block_ip(ip)?;
        let args = vec![
            "-I".to_string(),
            "INPUT".to_string(),
            "1".to_string(),
            "-s".to_string(),
            ip.to_string(),
            "-j".to_string(),
            "DROP".to_string(),
        ];
        self.execute_mutation(args, format!("Blocked {}", ip))
    }

    /// Remove the matching DROP for the source IP from INPUT.
    pub fn unblock_ip(&mut self, ip: &str) -> Result<MutationOutcome> {
        validate_block_ip(ip)?;
        let args = vec![
            "-D".to_string(),
            "INPUT".to_string(),
            "-s".to_string(),
            ip.to_string(),
            "-j".to_string(),
            "DROP".to_string(),
        ];
        self.execute_mutation(args, format!("Unblocked {}", ip))
    }

    /// Number of DROP entries in the INPUT chain of the current table.
    pub fn blocked_count(&self) -> usize {
        self.rules()
            .iter()
            .filter(|rule| rule.chain == "INPUT" && rule.target == "DROP")
            .count()
    }

    fn execute_mutation(&mut self, args: Vec<String>, ok_message: String) -> Result<MutationOutcome> {
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.runner.run(&self.iptables_bin, &arg_refs)?;

        if !output.success {
            let diagnostic = output.stderr.trim();
            return Ok(MutationOutcome {
                success: false,
                message: if diagnostic.is_empty() {
                    format!("{} exited with an error", self.iptables_bin)
                } else {
                    diagnostic.to_string()
                },
            });
        }

        // The table the caller sees next must reflect the mutation.
        self.poller.invalidate();
        if let Err(e) = self.poller.poll(true) {
            log::warn!("snapshot refresh after mutation failed: {}", e);
        }

        Ok(MutationOutcome {
            success: true,
            message: ok_message,
        })
    }
}

fn validate_block_ip(ip: &str) -> Result<()> {
    if !is_strict_ipv4(ip) {
        return Err(FwatchError::validation(format!(
            "'{}' is not a valid IPv4 address",
            ip
        )));
    }
    Ok(())
}
