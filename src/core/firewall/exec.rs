//! External command execution seam.
//!
//! Every interaction with the packet-filter tooling goes through the
//! [`CommandRunner`] trait so the rest of the firewall code can be exercised
//! against scripted outputs. Commands are always invoked with an explicit
//! argument vector; nothing is ever passed through a shell.

use std::process::Command;

use crate::error::{FwatchError, Result};

/// Captured result of one external command invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Whether the process exited with status zero
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Capability for running external commands.
///
/// No timeout is imposed on the child process; an unresponsive tool stalls
/// the invoking context.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;
}

/// Runner backed by real process spawning.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let output = Command::new(program).args(args).output().map_err(|e| {
            FwatchError::tool_invocation(format!("failed to execute {}: {}", program, e))
        })?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
