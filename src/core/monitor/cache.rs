use std::sync::Arc;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// The RAM temperature query goes through WMI and can block for hundreds of
/// milliseconds, so its result is reused for this long.
const RAM_TEMP_TTL: Duration = Duration::from_secs(5);

/// Time-bounded cache for a single expensive sensor value.
///
/// Only successful probes are stored; an absent value is re-probed on the
/// next call so recovery is immediate once the sensor appears. The lock is
/// held across the probe, which also serializes concurrent callers onto one
/// underlying query.
#[derive(Debug)]
pub struct TtlCache {
    slot: Mutex<Option<(Instant, f64)>>,
    ttl: Duration,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            ttl,
        }
    }

    /// Return the cached value while fresh, otherwise run `probe` and store
    /// a successful result.
    pub fn get_or_probe(&self, probe: impl FnOnce() -> Option<f64>) -> Option<f64> {
        let mut slot = self.slot.lock();
        if let Some((stored_at, value)) = *slot {
            if stored_at.elapsed() < self.ttl {
                return Some(value);
            }
        }
        let value = probe();
        if let Some(v) = value {
            *slot = Some((Instant::now(), v));
        }
        value
    }
}

static SHARED_RAM_TEMP: Lazy<Arc<TtlCache>> = Lazy::new(|| Arc::new(TtlCache::new(RAM_TEMP_TTL)));

/// Process-wide cache for the RAM temperature query. Every collector
/// instance shares this one so redundant queries cannot happen.
pub fn shared_ram_temp_cache() -> Arc<TtlCache> {
    Arc::clone(&SHARED_RAM_TEMP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn fresh_value_skips_the_probe() {
        let cache = TtlCache::new(Duration::from_secs(5));
        let calls = AtomicUsize::new(0);
        let probe = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Some(41.0)
        };

        assert_eq!(cache.get_or_probe(probe), Some(41.0));
        assert_eq!(cache.get_or_probe(probe), Some(41.0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn expired_value_is_probed_again() {
        let cache = TtlCache::new(Duration::from_millis(1));
        let calls = AtomicUsize::new(0);
        let probe = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Some(41.0)
        };

        cache.get_or_probe(probe);
        std::thread::sleep(Duration::from_millis(5));
        cache.get_or_probe(probe);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failed_probe_is_not_cached() {
        let cache = TtlCache::new(Duration::from_secs(5));
        let calls = AtomicUsize::new(0);
        let probe = || {
            calls.fetch_add(1, Ordering::SeqCst);
            None
        };

        assert_eq!(cache.get_or_probe(probe), None);
        assert_eq!(cache.get_or_probe(probe), None);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
