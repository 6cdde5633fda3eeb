use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use fwatch::core::firewall::{
    parse_listing, AddRule, CommandOutput, CommandRunner, FirewallManager, RuleProtocol,
    RulePoller, RuleTarget,
};
use fwatch::error::FwatchError;

/// Replays scripted outputs and records every invocation.
struct ScriptedRunner {
    outputs: Mutex<Vec<fwatch::Result<CommandOutput>>>,
    invocations: Mutex<Vec<Vec<String>>>,
    calls: AtomicUsize,
}

impl ScriptedRunner {
    fn new(outputs: Vec<fwatch::Result<CommandOutput>>) -> Arc<Self> {
        let mut outputs = outputs;
        outputs.reverse();
        Arc::new(Self {
            outputs: Mutex::new(outputs),
            invocations: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    fn ok(stdout: &str) -> fwatch::Result<CommandOutput> {
        Ok(CommandOutput {
            success: true,
            stdout: stdout.to_string(),
            stderr: String::new(),
        })
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, _program: &str, args: &[&str]) -> fwatch::Result<CommandOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.invocations
            .lock()
            .unwrap()
            .push(args.iter().map(|s| s.to_string()).collect());
        self.outputs
            .lock()
            .unwrap()
            .pop()
            .expect("scripted runner exhausted")
    }
}

const EMPTY_LISTING: &str = "\
Chain INPUT (policy ACCEPT)
num  target  prot opt source   destination
";

const ONE_RULE_LISTING: &str = "\
Chain INPUT (policy ACCEPT)
num  target  prot opt source    destination
1    DROP    tcp  --  10.0.0.5  0.0.0.0/0    tcp dpt:22
";

#[test]
fn test_single_rule_listing_parses_to_one_entry() {
    let raw = "\
Chain INPUT (policy ACCEPT)
num  target  prot opt source   destination
1    DROP    all  --  1.2.3.4  0.0.0.0/0
";
    let entries = parse_listing(raw);
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.chain, "INPUT");
    assert_eq!(entry.number, 1);
    assert_eq!(entry.target, "DROP");
    assert_eq!(entry.protocol, "all");
    assert_eq!(entry.opt, "--");
    assert_eq!(entry.source, "1.2.3.4");
    assert_eq!(entry.destination, "0.0.0.0/0");
    assert_eq!(entry.options, "");
}

#[test]
fn test_add_then_read_reflects_the_mutation() {
    let runner = ScriptedRunner::new(vec![
        ScriptedRunner::ok(EMPTY_LISTING),
        ScriptedRunner::ok(""),
        ScriptedRunner::ok(ONE_RULE_LISTING),
    ]);
    let mut manager = FirewallManager::new(runner.clone(), "iptables");

    manager.refresh(true).unwrap();
    assert!(manager.rules().is_empty());

    let rule = AddRule {
        chain: "INPUT".to_string(),
        target: RuleTarget::Drop,
        protocol: RuleProtocol::Tcp,
        source: Some("10.0.0.5".to_string()),
        dest_port: Some("22".to_string()),
    };
    let outcome = manager.add_rule(&rule).unwrap();
    assert!(outcome.success);

    let append = &runner.invocations.lock().unwrap()[1];
    assert_eq!(
        append,
        &vec!["-A", "INPUT", "-p", "tcp", "-s", "10.0.0.5", "--dport", "22", "-j", "DROP"]
    );

    let rules = manager.rules();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].protocol, "tcp");
    assert_eq!(rules[0].source, "10.0.0.5");
    assert_eq!(rules[0].target, "DROP");
    assert!(rules[0].options.contains("22"));
}

#[test]
fn test_port_with_icmp_is_rejected_before_any_invocation() {
    let runner = ScriptedRunner::new(vec![]);
    let mut manager = FirewallManager::new(runner.clone(), "iptables");

    let rule = AddRule {
        chain: "INPUT".to_string(),
        target: RuleTarget::Accept,
        protocol: RuleProtocol::Icmp,
        source: None,
        dest_port: Some("80".to_string()),
    };
    let err = manager.add_rule(&rule).unwrap_err();
    assert!(matches!(err, FwatchError::Validation(_)));
    assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_consecutive_identical_polls_report_no_change() {
    let runner = ScriptedRunner::new(vec![
        ScriptedRunner::ok(ONE_RULE_LISTING),
        ScriptedRunner::ok(ONE_RULE_LISTING),
        ScriptedRunner::ok(ONE_RULE_LISTING),
    ]);
    let mut poller = RulePoller::new(runner, "iptables");

    assert!(poller.poll(false).unwrap());
    assert!(!poller.poll(false).unwrap());
    // a forced poll right after still reports change
    assert!(poller.poll(true).unwrap());
}

#[test]
fn test_delete_uses_positional_number() {
    let runner = ScriptedRunner::new(vec![
        ScriptedRunner::ok(""),
        ScriptedRunner::ok(EMPTY_LISTING),
    ]);
    let mut manager = FirewallManager::new(runner.clone(), "iptables");

    let outcome = manager.delete_rule("INPUT", 1).unwrap();
    assert!(outcome.success);
    let delete = &runner.invocations.lock().unwrap()[0];
    assert_eq!(delete, &vec!["-D", "INPUT", "1"]);
}
