//! Parser for the packet-filter's textual listing format.
//!
//! The listing (`iptables -L -n --line-numbers`) is a sequence of per-chain
//! blocks: a `Chain <name> (...)` header, a column-header line starting with
//! `num`, then zero or more rule lines. Parsing is pure and never fails;
//! malformed lines are skipped.

use serde::{Deserialize, Serialize};

/// One rule from the packet-filter table.
///
/// `number` is only unique within `chain` as of the snapshot it came from.
/// Numbers shift after any delete in the chain, so it is not a stable
/// identifier across mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry {
    pub chain: String,
    pub number: u32,
    pub target: String,
    pub protocol: String,
    pub opt: String,
    pub source: String,
    pub destination: String,
    /// Free-form remainder of the line; may contain whitespace, may be empty
    pub options: String,
}

/// Parse raw listing output into an ordered rule table.
///
/// Chain context comes from the preceding header line and is attached to
/// every entry until the next header. Lines with fewer than six fields or a
/// non-numeric rule number contribute nothing.
pub fn parse_listing(raw: &str) -> Vec<RuleEntry> {
    let mut entries = Vec::new();
    let mut current_chain = String::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with("Chain") {
            current_chain = line
                .split_whitespace()
                .nth(1)
                .unwrap_or_default()
                .to_string();
            continue;
        }

        if line.starts_with("num") {
            continue;
        }

        let fields = split_limited(line, 7);
        if fields.len() < 6 {
            continue;
        }

        let number = match fields[0].parse::<u32>() {
            Ok(n) => n,
            Err(_) => continue,
        };

        entries.push(RuleEntry {
            chain: current_chain.clone(),
            number,
            target: fields[1].to_string(),
            protocol: fields[2].to_string(),
            opt: fields[3].to_string(),
            source: fields[4].to_string(),
            destination: fields[5].to_string(),
            options: fields.get(6).copied().unwrap_or_default().to_string(),
        });
    }

    entries
}

/// Split on whitespace runs into at most `max_fields` fields.
///
/// The final field is the untouched remainder of the line, so embedded
/// whitespace in a trailing options blob survives.
fn split_limited(line: &str, max_fields: usize) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut rest = line.trim_start();

    while !rest.is_empty() {
        if fields.len() == max_fields - 1 {
            fields.push(rest.trim_end());
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(idx) => {
                fields.push(&rest[..idx]);
                rest = rest[idx..].trim_start();
            }
            None => {
                fields.push(rest);
                break;
            }
        }
    }

    fields
}
