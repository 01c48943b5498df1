//! Network throughput collection.
//!
//! The only collector with required cross-call state: speeds are deltas
//! between the cumulative OS byte counters seen on consecutive calls.

use std::time::Instant;

use sysinfo::Networks;

use crate::core::monitor::snapshot::{sane, NetworkReading, BYTES_PER_GIB, BYTES_PER_MIB};

/// Cumulative transfer totals summed over all interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NetTotals {
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

pub(crate) type NetSource = Box<dyn FnMut() -> Option<NetTotals> + Send>;

/// Collects the `network` category.
pub struct NetworkCollector {
    counters: NetSource,
    last_sent: u64,
    last_received: u64,
    last_seen: Instant,
    /// Set when the previous cycle had no counters; the next successful
    /// cycle re-establishes the baseline instead of reporting the whole gap
    /// as one interval's worth of traffic.
    baseline_stale: bool,
}

impl NetworkCollector {
    pub fn new() -> Self {
        let mut networks = Networks::new_with_refreshed_list();
        let counters: NetSource = Box::new(move || {
            networks.refresh(true);
            if networks.iter().next().is_none() {
                return None;
            }
            let (sent, received) = networks.values().fold((0u64, 0u64), |(s, r), data| {
                (s + data.total_transmitted(), r + data.total_received())
            });
            Some(NetTotals {
                bytes_sent: sent,
                bytes_received: received,
            })
        });
        Self::with_counters(counters)
    }

    pub(crate) fn with_counters(counters: NetSource) -> Self {
        Self::with_counters_at(counters, Instant::now())
    }

    pub(crate) fn with_counters_at(mut counters: NetSource, now: Instant) -> Self {
        let baseline = counters();
        let stale = baseline.is_none();
        let baseline = baseline.unwrap_or(NetTotals {
            bytes_sent: 0,
            bytes_received: 0,
        });
        Self {
            counters,
            last_sent: baseline.bytes_sent,
            last_received: baseline.bytes_received,
            last_seen: now,
            baseline_stale: stale,
        }
    }

    pub fn collect(&mut self) -> NetworkReading {
        self.collect_at(Instant::now())
    }

    pub(crate) fn collect_at(&mut self, now: Instant) -> NetworkReading {
        let mut reading = NetworkReading::default();

        match (self.counters)() {
            Some(totals) => {
                let elapsed = now.saturating_duration_since(self.last_seen).as_secs_f64();
                if !self.baseline_stale && elapsed > 0.0 {
                    if totals.bytes_sent >= self.last_sent {
                        reading.upload_speed = sane(
                            (totals.bytes_sent - self.last_sent) as f64 / elapsed / BYTES_PER_MIB,
                        );
                    } else {
                        log::warn!("sent counter went backwards, skipping upload speed this cycle");
                    }
                    if totals.bytes_received >= self.last_received {
                        reading.download_speed = sane(
                            (totals.bytes_received - self.last_received) as f64
                                / elapsed
                                / BYTES_PER_MIB,
                        );
                    } else {
                        log::warn!(
                            "received counter went backwards, skipping download speed this cycle"
                        );
                    }
                }

                reading.total_sent = sane(totals.bytes_sent as f64 / BYTES_PER_GIB);
                reading.total_received = sane(totals.bytes_received as f64 / BYTES_PER_GIB);

                // Advance unconditionally: speed is always "since the
                // previous call", never accumulated drift.
                self.last_sent = totals.bytes_sent;
                self.last_received = totals.bytes_received;
                self.baseline_stale = false;
            }
            None => {
                log::warn!("network counters unavailable this cycle");
                self.last_sent = 0;
                self.last_received = 0;
                self.baseline_stale = true;

                if let Some((sent_gb, received_gb)) = hardware_monitor_totals() {
                    reading.total_sent = sane(sent_gb);
                    reading.total_received = sane(received_gb);
                }
            }
        }

        self.last_seen = now;
        reading
    }
}

impl Default for NetworkCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Cumulative totals from the hardware-monitor adapter counters, usable
/// while the generic source is down. Speeds stay absent either way.
#[cfg(windows)]
fn hardware_monitor_totals() -> Option<(f64, f64)> {
    use crate::platform::{classify, lhm};
    classify::network_totals(&lhm::sensors_or_empty())
}

#[cfg(not(windows))]
fn hardware_monitor_totals() -> Option<(f64, f64)> {
    None
}
