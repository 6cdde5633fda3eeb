//! Rule-table snapshot poller with change detection.
//!
//! The poller invokes the listing command and byte-compares the raw output
//! against the previous snapshot. Identical output means nothing is
//! re-parsed and the caller is told nothing changed, so the presentation
//! layer never redraws an unchanged table (anti-flicker).

use std::sync::Arc;

use crate::core::firewall::exec::CommandRunner;
use crate::core::firewall::parser::{parse_listing, RuleEntry};
use crate::error::{FwatchError, Result};

/// Flags producing numbered, numeric-address output.
const LISTING_ARGS: [&str; 3] = ["-L", "-n", "--line-numbers"];

/// Polls the packet-filter listing command and caches the raw snapshot.
///
/// The raw-snapshot cache is owned here exclusively and is used only for
/// change comparison; it is replaced wholesale on every successful re-parse.
pub struct RulePoller {
    runner: Arc<dyn CommandRunner>,
    iptables_bin: String,
    last_output: Option<String>,
    table: Vec<RuleEntry>,
    auto_enabled: bool,
}

impl RulePoller {
    pub fn new(runner: Arc<dyn CommandRunner>, iptables_bin: impl Into<String>) -> Self {
        Self {
            runner,
            iptables_bin: iptables_bin.into(),
            last_output: None,
            table: Vec::new(),
            auto_enabled: true,
        }
    }

    /// Fetch the current listing and rebuild the table if it changed.
    ///
    /// Returns whether the structured table was rebuilt. With `force` the
    /// cache comparison is bypassed and the output is always re-parsed.
    /// Failures leave the previous table and cache untouched.
    pub fn poll(&mut self, force: bool) -> Result<bool> {
        let output = self.runner.run(&self.iptables_bin, &LISTING_ARGS)?;
        if !output.success {
            return Err(FwatchError::tool_invocation(format!(
                "{} listing failed: {}",
                self.iptables_bin,
                output.stderr.trim()
            )));
        }

        if !force && self.last_output.as_deref() == Some(output.stdout.as_str()) {
            return Ok(false);
        }

        self.table = parse_listing(&output.stdout);
        self.last_output = Some(output.stdout);
        Ok(true)
    }

    /// One automatic-mode cycle: skipped entirely when automatic refresh is
    /// toggled off, and failures are swallowed (the previous table is kept).
    pub fn auto_poll(&mut self) -> bool {
        if !self.auto_enabled {
            return false;
        }
        match self.poll(false) {
            Ok(changed) => changed,
            Err(e) => {
                log::warn!("automatic rule poll failed: {}", e);
                false
            }
        }
    }

    /// Drop the cached raw snapshot so the next poll always re-parses.
    pub fn invalidate(&mut self) {
        self.last_output = None;
    }

    pub fn table(&self) -> &[RuleEntry] {
        &self.table
    }

    pub fn set_auto_enabled(&mut self, enabled: bool) {
        self.auto_enabled = enabled;
    }

    pub fn auto_enabled(&self) -> bool {
        self.auto_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::firewall::exec::CommandOutput;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Runner that replays scripted results and counts invocations.
    struct ScriptedRunner {
        outputs: Mutex<Vec<Result<CommandOutput>>>,
        calls: AtomicUsize,
    }

    impl ScriptedRunner {
        fn new(outputs: Vec<Result<CommandOutput>>) -> Self {
            let mut outputs = outputs;
            outputs.reverse();
            Self {
                outputs: Mutex::new(outputs),
                calls: AtomicUsize::new(0),
            }
        }

        fn ok(stdout: &str) -> Result<CommandOutput> {
            Ok(CommandOutput {
                success: true,
                stdout: stdout.to_string(),
                stderr: String::new(),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, _program: &str, _args: &[&str]) -> Result<CommandOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outputs
                .lock()
                .unwrap()
                .pop()
                .expect("scripted runner exhausted")
        }
    }

    const LISTING: &str = "\
Chain INPUT (policy ACCEPT)
num  target  prot opt source   destination
1    DROP    all  --  1.2.3.4  0.0.0.0/0
";

    #[test]
    fn test_unchanged_output_is_not_reparsed() {
        let runner = Arc::new(ScriptedRunner::new(vec![
            ScriptedRunner::ok(LISTING),
            ScriptedRunner::ok(LISTING),
        ]));
        let mut poller = RulePoller::new(runner.clone(), "iptables");

        assert!(poller.poll(false).unwrap());
        assert_eq!(poller.table().len(), 1);
        assert!(!poller.poll(false).unwrap());
        assert_eq!(runner.calls(), 2);
        assert_eq!(poller.table().len(), 1);
    }

    #[test]
    fn test_force_always_reparses() {
        let runner = Arc::new(ScriptedRunner::new(vec![
            ScriptedRunner::ok(LISTING),
            ScriptedRunner::ok(LISTING),
        ]));
        let mut poller = RulePoller::new(runner, "iptables");

        assert!(poller.poll(false).unwrap());
        assert!(poller.poll(true).unwrap());
    }

    #[test]
    fn test_invalidate_clears_the_cache() {
        let runner = Arc::new(ScriptedRunner::new(vec![
            ScriptedRunner::ok(LISTING),
            ScriptedRunner::ok(LISTING),
        ]));
        let mut poller = RulePoller::new(runner, "iptables");

        assert!(poller.poll(false).unwrap());
        poller.invalidate();
        assert!(poller.poll(false).unwrap());
    }

    #[test]
    fn test_changed_output_rebuilds_table() {
        let updated = "\
Chain INPUT (policy ACCEPT)
num  target  prot opt source   destination
1    DROP    all  --  1.2.3.4  0.0.0.0/0
2    ACCEPT  tcp  --  0.0.0.0/0  0.0.0.0/0
";
        let runner = Arc::new(ScriptedRunner::new(vec![
            ScriptedRunner::ok(LISTING),
            ScriptedRunner::ok(updated),
        ]));
        let mut poller = RulePoller::new(runner, "iptables");

        assert!(poller.poll(false).unwrap());
        assert!(poller.poll(false).unwrap());
        assert_eq!(poller.table().len(), 2);
    }

    #[test]
    fn test_auto_poll_swallows_failures_and_keeps_table() {
        let runner = Arc::new(ScriptedRunner::new(vec![
            ScriptedRunner::ok(LISTING),
            Err(FwatchError::tool_invocation("iptables not found")),
        ]));
        let mut poller = RulePoller::new(runner, "iptables");

        assert!(poller.poll(false).unwrap());
        assert!(!poller.auto_poll());
        assert_eq!(poller.table().len(), 1);
    }

    #[test]
    fn test_auto_poll_respects_toggle() {
        let runner = Arc::new(ScriptedRunner::new(vec![ScriptedRunner::ok(LISTING)]));
        let mut poller = RulePoller::new(runner.clone(), "iptables");

        poller.set_auto_enabled(false);
        assert!(!poller.auto_poll());
        assert_eq!(runner.calls(), 0);

        poller.set_auto_enabled(true);
        assert!(poller.auto_poll());
        assert_eq!(runner.calls(), 1);
    }

    #[test]
    fn test_manual_poll_surfaces_nonzero_exit() {
        let runner = Arc::new(ScriptedRunner::new(vec![Ok(CommandOutput {
            success: false,
            stdout: String::new(),
            stderr: "permission denied".to_string(),
        })]));
        let mut poller = RulePoller::new(runner, "iptables");

        let err = poller.poll(true).unwrap_err();
        assert!(matches!(err, FwatchError::ToolInvocation(_)));
        assert!(err.to_string().contains("permission denied"));
    }
}
