//! Tokio runtime and sampling loop for telemetry collection.
//!
//! One background loop runs for the process lifetime, sampling on a fixed
//! cadence and publishing immutable snapshots over a watch channel. The
//! presentation side only ever reads the channel; it cannot block the loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::time::{interval, MissedTickBehavior};

use crate::core::firewall::exec::{CommandRunner, SystemRunner};
use crate::error::Result;

use super::alerts::AlertIngester;
use super::connections::ConnectionSampler;
use super::history::TelemetryHistory;
use super::metrics::{ConnectionSample, TelemetrySnapshot};
use super::system::ResourceSampler;

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub ss_bin: String,
    pub alert_log: PathBuf,
    pub sample_interval: Duration,
    /// Sleep after a loop-level fault before resuming normal cadence
    pub failure_backoff: Duration,
    pub top_ips: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            ss_bin: "ss".to_string(),
            alert_log: PathBuf::from("/var/log/firewall_alerts.json"),
            sample_interval: Duration::from_secs(2),
            failure_backoff: Duration::from_secs(30),
            top_ips: 10,
        }
    }
}

/// Wrapper around the Tokio runtime for telemetry collection.
pub struct TelemetryRuntime {
    /// Receiver for telemetry snapshots
    pub snapshot_rx: watch::Receiver<Arc<TelemetrySnapshot>>,

    /// Shutdown signal sender
    shutdown_tx: broadcast::Sender<()>,

    /// Handle to the runtime (for shutdown)
    _runtime: tokio::runtime::Runtime,
}

impl TelemetryRuntime {
    /// Create the runtime and spawn the sampling loop.
    pub fn start(config: TelemetryConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .thread_name("telemetry-worker")
            .build()?;

        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(TelemetrySnapshot::default()));
        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        let shutdown_rx = shutdown_tx.subscribe();
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
        runtime.spawn(sampling_loop(config, runner, snapshot_tx, shutdown_rx));

        Ok(Self {
            snapshot_rx,
            shutdown_tx,
            _runtime: runtime,
        })
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<TelemetrySnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// Shutdown the runtime gracefully.
    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        // Runtime shuts down when dropped
    }
}

/// The sampling loop. Owns all ring buffers for its lifetime.
async fn sampling_loop(
    config: TelemetryConfig,
    runner: Arc<dyn CommandRunner>,
    snapshot_tx: watch::Sender<Arc<TelemetrySnapshot>>,
    mut shutdown: broadcast::Receiver<()>,
) {
    log::info!(
        "telemetry loop started (interval {:?}, alert log {})",
        config.sample_interval,
        config.alert_log.display()
    );

    let connections = ConnectionSampler::new(runner, config.ss_bin.clone());
    let mut resources = ResourceSampler::new();
    let ingester = AlertIngester::new(config.alert_log.clone());
    let mut history = TelemetryHistory::new();

    let mut ticker = interval(config.sample_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let faulted = run_cycle(&connections, &mut resources, &ingester, &mut history);

                // watch::send only fails with no receivers, which is fine
                let _ = snapshot_tx.send(Arc::new(history.snapshot(config.top_ips)));

                if faulted {
                    log::warn!(
                        "every telemetry probe failed this cycle; backing off {:?}",
                        config.failure_backoff
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(config.failure_backoff) => {
                            ticker.reset();
                        }
                        _ = shutdown.recv() => break,
                    }
                }
            }
            _ = shutdown.recv() => break,
        }
    }

    log::info!("telemetry loop stopped");
}

/// One sampling cycle. Each probe's failure is isolated: it is logged and
/// the remaining probes still run. Returns true only when every external
/// probe failed at the invocation level (the loop-level fault that triggers
/// backoff).
fn run_cycle(
    connections: &ConnectionSampler,
    resources: &mut ResourceSampler,
    ingester: &AlertIngester,
    history: &mut TelemetryHistory,
) -> bool {
    let mut probe_failures = 0;

    match connections.established_count() {
        Ok(established) => history.push_connection(ConnectionSample {
            timestamp: chrono::Utc::now().timestamp(),
            established,
        }),
        Err(e) => {
            probe_failures += 1;
            log::warn!("connection count probe failed: {}", e);
        }
    }

    match connections.remote_tally() {
        Ok(tally) => history.set_tally(tally),
        Err(e) => {
            // Previous tally is retained unchanged
            probe_failures += 1;
            log::warn!("remote tally probe failed: {}", e);
        }
    }

    // Degrades to zero-valued samples on its own, never fails the cycle
    history.push_system(resources.sample());

    let added = ingester.ingest(history);
    if !added.is_empty() {
        log::debug!("ingested {} new alert line(s)", added.len());
    }

    probe_failures == 2
}
