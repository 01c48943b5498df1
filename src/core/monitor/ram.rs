//! RAM metrics collection.

use std::sync::Arc;

use sysinfo::{MemoryRefreshKind, RefreshKind, System};

use crate::core::monitor::cache::{shared_ram_temp_cache, TtlCache};
use crate::core::monitor::snapshot::{sane, RamReading, BYTES_PER_GIB};
use crate::platform::{classify, lhm};

/// One virtual-memory read. The four size keys come from a single call and
/// succeed or fail together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MemTotals {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
}

pub(crate) type MemSource = Box<dyn FnMut() -> Option<MemTotals> + Send>;
pub(crate) type TempProbe = Box<dyn FnMut() -> Option<f64> + Send>;

/// Collects the `ram` category.
///
/// Temperature has no generic OS source and may need a privileged service
/// the process cannot start itself; when no channel yields a value the key
/// stays absent.
pub struct RamCollector {
    memory: MemSource,
    temp_probe: TempProbe,
    temp_cache: Arc<TtlCache>,
}

impl RamCollector {
    pub fn new() -> Self {
        let mut system = System::new_with_specifics(
            RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()),
        );
        let memory: MemSource = Box::new(move || {
            system.refresh_memory();
            let total = system.total_memory();
            (total > 0).then(|| MemTotals {
                total_bytes: total,
                used_bytes: system.used_memory(),
                available_bytes: system.available_memory(),
            })
        });

        Self::with_parts(
            memory,
            Box::new(platform_ram_temperature),
            shared_ram_temp_cache(),
        )
    }

    pub(crate) fn with_parts(memory: MemSource, temp_probe: TempProbe, temp_cache: Arc<TtlCache>) -> Self {
        Self {
            memory,
            temp_probe,
            temp_cache,
        }
    }

    pub fn collect(&mut self) -> RamReading {
        let mut reading = RamReading::default();

        match (self.memory)() {
            Some(memory) => {
                reading.total = sane(memory.total_bytes as f64 / BYTES_PER_GIB);
                reading.used = sane(memory.used_bytes as f64 / BYTES_PER_GIB);
                reading.available = sane(memory.available_bytes as f64 / BYTES_PER_GIB);
                reading.percent =
                    sane(memory.used_bytes as f64 / memory.total_bytes as f64 * 100.0);
            }
            None => log::warn!("virtual memory statistics unavailable"),
        }

        let probe = &mut self.temp_probe;
        reading.ram_temperature = self.temp_cache.get_or_probe(|| probe());

        reading
    }
}

impl Default for RamCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Platform channels for the module temperature, in precedence order.
fn platform_ram_temperature() -> Option<f64> {
    if let Some(t) = classify::ram_temperature(&lhm::sensors_or_empty()) {
        return Some(t);
    }
    #[cfg(target_os = "linux")]
    if let Some(t) = crate::platform::shell::sensors_ram_temperature() {
        return Some(t);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const GIB: u64 = 1024 * 1024 * 1024;

    fn collector_with(
        memory: Option<MemTotals>,
        temp: Option<f64>,
        calls: Arc<AtomicUsize>,
        cache: Arc<TtlCache>,
    ) -> RamCollector {
        RamCollector::with_parts(
            Box::new(move || memory),
            Box::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                temp
            }),
            cache,
        )
    }

    #[test]
    fn size_keys_come_from_one_read() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memory = MemTotals {
            total_bytes: 32 * GIB,
            used_bytes: 8 * GIB,
            available_bytes: 24 * GIB,
        };
        let mut collector = collector_with(
            Some(memory),
            None,
            calls,
            Arc::new(TtlCache::new(Duration::from_secs(5))),
        );

        let reading = collector.collect();
        assert_eq!(reading.total, Some(32.0));
        assert_eq!(reading.used, Some(8.0));
        assert_eq!(reading.available, Some(24.0));
        assert_eq!(reading.percent, Some(25.0));
    }

    #[test]
    fn failed_read_degrades_all_size_keys_together() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut collector = collector_with(
            None,
            Some(39.0),
            calls,
            Arc::new(TtlCache::new(Duration::from_secs(5))),
        );

        let reading = collector.collect();
        assert_eq!(reading.total, None);
        assert_eq!(reading.used, None);
        assert_eq!(reading.available, None);
        assert_eq!(reading.percent, None);
        assert_eq!(reading.ram_temperature, Some(39.0));
    }

    #[test]
    fn temperature_probe_runs_once_within_ttl() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memory = MemTotals {
            total_bytes: 16 * GIB,
            used_bytes: 4 * GIB,
            available_bytes: 12 * GIB,
        };
        let mut collector = collector_with(
            Some(memory),
            Some(38.5),
            Arc::clone(&calls),
            Arc::new(TtlCache::new(Duration::from_secs(5))),
        );

        let first = collector.collect();
        let second = collector.collect();
        assert_eq!(first.ram_temperature, Some(38.5));
        assert_eq!(second.ram_temperature, Some(38.5));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn absent_temperature_is_probed_each_cycle() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut collector = collector_with(
            None,
            None,
            Arc::clone(&calls),
            Arc::new(TtlCache::new(Duration::from_secs(5))),
        );

        assert_eq!(collector.collect().ram_temperature, None);
        assert_eq!(collector.collect().ram_temperature, None);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn collectors_share_one_cache() {
        let calls_a = Arc::new(AtomicUsize::new(0));
        let calls_b = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(TtlCache::new(Duration::from_secs(5)));
        let mut a = collector_with(None, Some(40.0), Arc::clone(&calls_a), Arc::clone(&cache));
        let mut b = collector_with(None, Some(44.0), Arc::clone(&calls_b), Arc::clone(&cache));

        assert_eq!(a.collect().ram_temperature, Some(40.0));
        // The second instance hits the shared cache, not its own probe.
        assert_eq!(b.collect().ram_temperature, Some(40.0));
        assert_eq!(calls_a.load(Ordering::SeqCst), 1);
        assert_eq!(calls_b.load(Ordering::SeqCst), 0);
    }
}
