//! Hardware metrics aggregation.
//!
//! Four per-category collectors, each trying several platform sources with a
//! fixed precedence, merged into immutable snapshots by [`HardwareMonitor`].
//! [`MetricsRuntime`] drives collection on a background worker.

mod cache;
mod cpu;
mod gpu;
mod network;
mod ram;
mod runtime;
pub mod snapshot;

pub use cache::{shared_ram_temp_cache, TtlCache};
pub use cpu::CpuCollector;
pub use gpu::GpuCollector;
pub use network::NetworkCollector;
pub use ram::RamCollector;
pub use runtime::{MetricsRuntime, PollConfig};
pub use snapshot::{CpuReading, GpuReading, MetricSnapshot, NetworkReading, RamReading};

use std::panic::{catch_unwind, AssertUnwindSafe};

/// Aggregates the four category collectors into point-in-time snapshots.
///
/// Collector instances live for the process lifetime; snapshots are created
/// fresh on every call and never mutated afterwards.
pub struct HardwareMonitor {
    cpu: CpuCollector,
    gpu: GpuCollector,
    ram: RamCollector,
    network: NetworkCollector,
}

impl HardwareMonitor {
    pub fn new() -> Self {
        log::info!("initializing hardware monitor collectors");
        Self {
            cpu: CpuCollector::new(),
            gpu: GpuCollector::new(),
            ram: RamCollector::new(),
            network: NetworkCollector::new(),
        }
    }

    pub(crate) fn with_collectors(
        cpu: CpuCollector,
        gpu: GpuCollector,
        ram: RamCollector,
        network: NetworkCollector,
    ) -> Self {
        Self {
            cpu,
            gpu,
            ram,
            network,
        }
    }

    /// Collect every category once. Never panics: a collector breaking its
    /// no-panic contract costs its own category, not the others.
    pub fn collect_all(&mut self) -> MetricSnapshot {
        let cpu = guard("cpu", AssertUnwindSafe(|| self.cpu.collect()));
        let gpu = guard("gpu", AssertUnwindSafe(|| self.gpu.collect()));
        let ram = guard("ram", AssertUnwindSafe(|| self.ram.collect()));
        let network = guard("network", AssertUnwindSafe(|| self.network.collect()));

        MetricSnapshot {
            timestamp: chrono::Utc::now().timestamp(),
            cpu,
            gpu,
            ram,
            network,
        }
    }
}

impl Default for HardwareMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn guard<T: Default, F: FnOnce() -> T>(category: &str, f: AssertUnwindSafe<F>) -> T {
    match catch_unwind(f) {
        Ok(reading) => reading,
        Err(_) => {
            log::error!("{category} collector panicked, reporting an empty category");
            T::default()
        }
    }
}
