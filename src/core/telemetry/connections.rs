//! Established-connection sampling over the socket statistics tool.
//!
//! Two independent probes run each cycle: a total count of established TCP
//! connections, and a per-remote-address tally rebuilt from scratch. Both
//! parse the same listing shape: a header line, then one line per socket
//! whose last whitespace field is the peer address.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::firewall::exec::CommandRunner;
use crate::error::{FwatchError, Result};

const LISTING_ARGS: [&str; 4] = ["-t", "-n", "state", "established"];

pub struct ConnectionSampler {
    runner: Arc<dyn CommandRunner>,
    ss_bin: String,
}

impl ConnectionSampler {
    pub fn new(runner: Arc<dyn CommandRunner>, ss_bin: impl Into<String>) -> Self {
        Self {
            runner,
            ss_bin: ss_bin.into(),
        }
    }

    /// Total number of established connections right now.
    pub fn established_count(&self) -> Result<u64> {
        Ok(count_established(&self.listing()?))
    }

    /// Freshly built per-remote-address tally for this cycle.
    pub fn remote_tally(&self) -> Result<HashMap<String, u64>> {
        Ok(tally_remote_addresses(&self.listing()?))
    }

    fn listing(&self) -> Result<String> {
        let output = self.runner.run(&self.ss_bin, &LISTING_ARGS)?;
        if !output.success {
            return Err(FwatchError::tool_invocation(format!(
                "{} listing failed: {}",
                self.ss_bin,
                output.stderr.trim()
            )));
        }
        Ok(output.stdout)
    }
}

/// Count data lines (everything after the header).
pub fn count_established(raw: &str) -> u64 {
    raw.lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .count() as u64
}

/// Tally remote addresses across data lines.
///
/// Loopback and anything without an IPv4-style shape is dropped; the result
/// never accumulates across cycles.
pub fn tally_remote_addresses(raw: &str) -> HashMap<String, u64> {
    let mut tally = HashMap::new();
    for line in raw.lines().skip(1) {
        let Some(peer) = line.split_whitespace().last() else {
            continue;
        };
        let ip = normalize_remote_addr(peer);
        if is_tallyable_ip(&ip) {
            *tally.entry(ip).or_insert(0) += 1;
        }
    }
    tally
}

/// Strip the port from a peer address.
///
/// Bracketed IPv6 (`[::1]:443`) keeps the text inside the brackets; any
/// other form keeps everything before the final colon.
pub fn normalize_remote_addr(addr: &str) -> String {
    if let Some(end) = addr.find(']') {
        return addr[..end].trim_start_matches('[').to_string();
    }
    match addr.rfind(':') {
        Some(idx) => addr[..idx].to_string(),
        None => addr.to_string(),
    }
}

/// Accepted address shape for tallying: non-loopback, exactly four
/// dot-separated components. No per-octet range check.
pub fn is_tallyable_ip(ip: &str) -> bool {
    if ip.is_empty() || ip == "127.0.0.1" || ip == "::1" {
        return false;
    }
    ip.split('.').count() == 4
}
