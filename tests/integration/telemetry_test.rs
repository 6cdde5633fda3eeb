use std::io::Write;

use fwatch::core::telemetry::{
    count_established, tally_remote_addresses, AlertIngester, ConnectionSample, TelemetryHistory,
    ALERT_HISTORY, CONNECTION_HISTORY,
};
use tempfile::NamedTempFile;

const SS_LISTING: &str = "\
Recv-Q  Send-Q  Local Address:Port  Peer Address:Port
0       0       192.168.1.2:22      203.0.113.9:50001
0       0       192.168.1.2:443     203.0.113.9:50002
0       0       192.168.1.2:443     203.0.113.9:50003
0       0       192.168.1.2:80      198.51.100.7:41000
0       0       127.0.0.1:9000      127.0.0.1:41001
";

#[test]
fn test_count_and_tally_from_one_listing() {
    assert_eq!(count_established(SS_LISTING), 5);

    let tally = tally_remote_addresses(SS_LISTING);
    assert_eq!(tally.get("203.0.113.9"), Some(&3));
    assert_eq!(tally.get("198.51.100.7"), Some(&1));
    assert!(!tally.contains_key("127.0.0.1"));
}

#[test]
fn test_history_snapshot_is_a_detached_copy() {
    let mut history = TelemetryHistory::new();
    history.push_connection(ConnectionSample {
        timestamp: 1,
        established: 7,
    });

    let snapshot = history.snapshot(5);
    history.push_connection(ConnectionSample {
        timestamp: 2,
        established: 9,
    });

    // the handed-out snapshot does not observe later writes
    assert_eq!(snapshot.connections.len(), 1);
    assert_eq!(snapshot.connections[0].established, 7);
    assert_eq!(history.connection_len(), 2);
}

#[test]
fn test_connection_ring_never_exceeds_capacity() {
    let mut history = TelemetryHistory::new();
    for i in 0..(CONNECTION_HISTORY * 2) {
        history.push_connection(ConnectionSample {
            timestamp: i as i64,
            established: 0,
        });
    }
    assert_eq!(history.connection_len(), CONNECTION_HISTORY);
}

#[test]
fn test_alert_ingestion_is_idempotent_and_bounded() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
            {{"timestamp": 1700000000, "ip": "203.0.113.1", "reason": "port scan"}},
            {{"timestamp": 1700000002, "ip": "203.0.113.2", "reason": "syn flood"}}
        ]"#
    )
    .unwrap();

    let ingester = AlertIngester::new(file.path());
    let mut history = TelemetryHistory::new();

    assert_eq!(ingester.ingest(&mut history).len(), 2);
    let size_after_first = history.alert_len();
    assert_eq!(ingester.ingest(&mut history).len(), 0);
    assert_eq!(history.alert_len(), size_after_first);
    assert!(history.alert_len() <= ALERT_HISTORY);
}
