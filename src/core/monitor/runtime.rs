//! Background polling runtime.
//!
//! A single worker invokes the aggregator on a fixed interval, off the
//! caller's thread, and publishes snapshots over a watch channel. Sensor
//! queries can block for hundreds of milliseconds; none of that may ever
//! reach a UI thread.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::time::{interval, Duration, MissedTickBehavior};

use super::snapshot::MetricSnapshot;
use super::HardwareMonitor;

const MIN_POLL_INTERVAL_SECS: f64 = 0.1;
const MAX_POLL_INTERVAL_SECS: f64 = 5.0;

/// Polling configuration.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Seconds between collection cycles, clamped to [0.1, 5.0].
    pub interval_secs: f64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_secs: 1.0 }
    }
}

impl PollConfig {
    /// The interval actually used, clamped to the supported range.
    pub fn clamped_interval(&self) -> Duration {
        Duration::from_secs_f64(
            self.interval_secs
                .clamp(MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS),
        )
    }
}

/// Wrapper around the Tokio runtime driving snapshot collection.
pub struct MetricsRuntime {
    /// Receiver for snapshot updates. Snapshots arrive in production order.
    pub snapshot_rx: watch::Receiver<Arc<MetricSnapshot>>,

    /// Shutdown signal sender
    shutdown_tx: broadcast::Sender<()>,

    /// Handle to the runtime (for shutdown)
    _runtime: tokio::runtime::Runtime,
}

impl MetricsRuntime {
    /// Spawn the polling worker with all collectors constructed on it.
    pub fn new(config: PollConfig) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .thread_name("metrics-worker")
            .build()?;

        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(MetricSnapshot::default()));
        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        let shutdown_rx = shutdown_tx.subscribe();
        runtime.spawn(poll_task(snapshot_tx, shutdown_rx, config.clamped_interval()));

        Ok(Self {
            snapshot_rx,
            shutdown_tx,
            _runtime: runtime,
        })
    }

    /// Stop scheduling further cycles. A cycle already in flight completes;
    /// nothing interrupts a blocking sensor query mid-call.
    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        // Runtime shuts down when dropped
    }
}

async fn poll_task(
    snapshot_tx: watch::Sender<Arc<MetricSnapshot>>,
    mut shutdown: broadcast::Receiver<()>,
    tick: Duration,
) {
    let mut monitor = HardwareMonitor::new();

    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = monitor.collect_all();
                // send() only fails when every receiver is gone
                if snapshot_tx.send(Arc::new(snapshot)).is_err() {
                    break;
                }
            }
            _ = shutdown.recv() => {
                log::info!("metrics polling stopped");
                break;
            }
        }
    }
}
