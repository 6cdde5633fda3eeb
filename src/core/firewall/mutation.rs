//! Rule mutation requests: closed vocabularies, validation, and argument
//! vector construction.
//!
//! Validation happens before anything touches the external tool. Arguments
//! are shape-checked individually because they end up in an argv, never in a
//! shell string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FwatchError, Result};

/// Action a rule takes when it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleTarget {
    Drop,
    Accept,
    Reject,
}

impl RuleTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleTarget::Drop => "DROP",
            RuleTarget::Accept => "ACCEPT",
            RuleTarget::Reject => "REJECT",
        }
    }
}

impl FromStr for RuleTarget {
    type Err = FwatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "DROP" => Ok(RuleTarget::Drop),
            "ACCEPT" => Ok(RuleTarget::Accept),
            "REJECT" => Ok(RuleTarget::Reject),
            other => Err(FwatchError::validation(format!(
                "unknown target '{}' (expected DROP, ACCEPT or REJECT)",
                other
            ))),
        }
    }
}

impl fmt::Display for RuleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol a rule matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleProtocol {
    Tcp,
    Udp,
    Icmp,
    All,
}

impl RuleProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleProtocol::Tcp => "tcp",
            RuleProtocol::Udp => "udp",
            RuleProtocol::Icmp => "icmp",
            RuleProtocol::All => "all",
        }
    }

    /// Destination ports only make sense for tcp and udp
    pub fn supports_port(&self) -> bool {
        matches!(self, RuleProtocol::Tcp | RuleProtocol::Udp)
    }
}

impl FromStr for RuleProtocol {
    type Err = FwatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(RuleProtocol::Tcp),
            "udp" => Ok(RuleProtocol::Udp),
            "icmp" => Ok(RuleProtocol::Icmp),
            "all" => Ok(RuleProtocol::All),
            other => Err(FwatchError::validation(format!(
                "unknown protocol '{}' (expected tcp, udp, icmp or all)",
                other
            ))),
        }
    }
}

impl fmt::Display for RuleProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated request to append one rule to a chain.
#[derive(Debug, Clone)]
pub struct AddRule {
    pub chain: String,
    pub target: RuleTarget,
    pub protocol: RuleProtocol,
    /// Passed through to the tool uninterpreted; the tool validates syntax
    pub source: Option<String>,
    pub dest_port: Option<String>,
}

/// Outcome of one mutation, as consumed by the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationOutcome {
    pub success: bool,
    pub message: String,
}

/// Build the append argv: `-A <chain> [-p <prot>] [-s <src>] [--dport <port>] -j <target>`.
///
/// The protocol flag is omitted for `all`, matching the tool's default.
pub fn build_add_args(rule: &AddRule) -> Result<Vec<String>> {
    validate_chain_name(&rule.chain)?;

    if let Some(port) = rule.dest_port.as_deref() {
        if !rule.protocol.supports_port() {
            return Err(FwatchError::validation(format!(
                "destination port requires tcp or udp, not {}",
                rule.protocol
            )));
        }
        validate_port(port)?;
    }

    let mut args = vec!["-A".to_string(), rule.chain.clone()];
    if rule.protocol != RuleProtocol::All {
        args.push("-p".to_string());
        args.push(rule.protocol.as_str().to_string());
    }
    if let Some(source) = rule.source.as_deref() {
        if !source.is_empty() {
            args.push("-s".to_string());
            args.push(source.to_string());
        }
    }
    if let Some(port) = rule.dest_port.as_deref() {
        args.push("--dport".to_string());
        args.push(port.to_string());
    }
    args.push("-j".to_string());
    args.push(rule.target.as_str().to_string());

    Ok(args)
}

/// Build the delete argv: `-D <chain> <number>`.
///
/// The number addresses the rule positionally as of the most recent
/// snapshot. Another actor mutating the chain in between can shift numbers,
/// making this delete the wrong rule; that is inherent to positional
/// addressing and is not detected here.
pub fn build_delete_args(chain: &str, number: u32) -> Result<Vec<String>> {
    validate_chain_name(chain)?;
    if number == 0 {
        return Err(FwatchError::validation("rule numbers start at 1"));
    }
    Ok(vec!["-D".to_string(), chain.to_string(), number.to_string()])
}

/// Chain names come from user input and land in an argv; constrain their shape.
pub fn validate_chain_name(chain: &str) -> Result<()> {
    if chain.is_empty() {
        return Err(FwatchError::validation("chain name must not be empty"));
    }
    if !chain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(FwatchError::validation(format!(
            "invalid chain name '{}'",
            chain
        )));
    }
    Ok(())
}

fn validate_port(port: &str) -> Result<()> {
    match port.parse::<u32>() {
        Ok(n) if (1..=65535).contains(&n) => Ok(()),
        _ => Err(FwatchError::validation(format!(
            "invalid destination port '{}'",
            port
        ))),
    }
}

/// Strict dotted-quad check used for block/unblock requests.
pub fn is_strict_ipv4(ip: &str) -> bool {
    let parts: Vec<&str> = ip.split('.').collect();
    if parts.len() != 4 {
        return false;
    }
    parts.iter().all(|part| {
        !part.is_empty()
            && part.chars().all(|c| c.is_ascii_digit())
            && part.parse::<u16>().map(|n| n <= 255).unwrap_or(false)
    })
}
