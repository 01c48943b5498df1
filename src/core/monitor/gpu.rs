//! GPU metrics collection.

use crate::core::monitor::snapshot::{sane, GpuReading};
use crate::platform::nvml::NvmlHandle;
use crate::platform::shell::SmiMetrics;
use crate::platform::{classify, lhm, shell};

/// A source of partial GPU readings, in precedence order.
pub(crate) type GpuSource = Box<dyn FnMut() -> GpuReading + Send>;

/// Collects the `gpu` category for the primary adapter.
///
/// Vendor telemetry outranks hardware-monitor sensors, which outrank tool
/// output; the sensor pass always runs so integrated or secondary adapters
/// can fill what the vendor library missed.
pub struct GpuCollector {
    sources: Vec<GpuSource>,
}

impl GpuCollector {
    pub fn new() -> Self {
        let nvml = NvmlHandle::probe();
        let nvml_available = nvml.is_available();

        let mut sources: Vec<GpuSource> = vec![
            Box::new(move || nvml.read()),
            Box::new(|| classify::classify_gpu_sensors(&lhm::sensors_or_empty())),
        ];
        // nvidia-smi reads the same adapter NVML would; only worth spawning
        // when the library itself is out of reach.
        if !nvml_available {
            sources.push(Box::new(|| {
                shell::nvidia_smi_metrics(0)
                    .map(smi_reading)
                    .unwrap_or_default()
            }));
        }
        #[cfg(target_os = "macos")]
        sources.push(Box::new(|| GpuReading {
            vram_total_gb: shell::system_profiler_vram_total_gb(),
            ..Default::default()
        }));

        Self::with_sources(sources)
    }

    pub(crate) fn with_sources(sources: Vec<GpuSource>) -> Self {
        Self { sources }
    }

    pub fn collect(&mut self) -> GpuReading {
        let mut reading = GpuReading::default();
        for source in &mut self.sources {
            reading.fill_missing_from(source());
        }

        // Derive the percentage when a source supplied only the raw sizes.
        if reading.vram_usage_percent.is_none() {
            if let (Some(used), Some(total)) = (reading.vram_used_gb, reading.vram_total_gb) {
                if total > 0.0 {
                    reading.vram_usage_percent = sane(used / total * 100.0);
                }
            }
        }

        reading
    }
}

impl Default for GpuCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn smi_reading(metrics: SmiMetrics) -> GpuReading {
    GpuReading {
        core_usage: metrics.core_usage,
        core_temperature: metrics.core_temperature,
        core_frequency: metrics.core_frequency,
        memory_frequency: metrics.memory_frequency,
        vram_used_gb: metrics.vram_used_gb,
        vram_total_gb: metrics.vram_total_gb,
        fan_speed: metrics.fan_speed,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(reading: GpuReading) -> GpuSource {
        Box::new(move || reading.clone())
    }

    #[test]
    fn later_sources_fill_gaps_without_overwriting() {
        let vendor = fixed(GpuReading {
            core_temperature: Some(61.0),
            core_usage: Some(42.0),
            ..Default::default()
        });
        let sensors = fixed(GpuReading {
            core_temperature: Some(59.0),
            memory_frequency: Some(7000.0),
            ..Default::default()
        });
        let mut collector = GpuCollector::with_sources(vec![vendor, sensors]);

        let reading = collector.collect();
        assert_eq!(reading.core_temperature, Some(61.0));
        assert_eq!(reading.core_usage, Some(42.0));
        assert_eq!(reading.memory_frequency, Some(7000.0));
    }

    #[test]
    fn vram_percent_derived_from_sizes() {
        let source = fixed(GpuReading {
            vram_used_gb: Some(2.0),
            vram_total_gb: Some(8.0),
            ..Default::default()
        });
        let mut collector = GpuCollector::with_sources(vec![source]);

        let reading = collector.collect();
        let percent = reading.vram_usage_percent.unwrap();
        assert!((percent - 25.0).abs() < 1e-9);
    }

    #[test]
    fn vram_percent_from_a_source_is_kept() {
        let source = fixed(GpuReading {
            vram_usage_percent: Some(37.0),
            vram_used_gb: Some(2.0),
            vram_total_gb: Some(8.0),
            ..Default::default()
        });
        let mut collector = GpuCollector::with_sources(vec![source]);

        assert_eq!(collector.collect().vram_usage_percent, Some(37.0));
    }

    #[test]
    fn zero_total_vram_yields_no_percent() {
        let source = fixed(GpuReading {
            vram_used_gb: Some(0.0),
            vram_total_gb: Some(0.0),
            ..Default::default()
        });
        let mut collector = GpuCollector::with_sources(vec![source]);

        assert_eq!(collector.collect().vram_usage_percent, None);
    }

    #[test]
    fn no_sources_yield_an_all_absent_reading() {
        let mut collector = GpuCollector::with_sources(Vec::new());
        assert_eq!(collector.collect(), GpuReading::default());
    }

    #[test]
    fn smi_metrics_map_onto_reading_keys() {
        let reading = smi_reading(SmiMetrics {
            core_usage: Some(42.0),
            core_temperature: Some(61.0),
            vram_used_gb: Some(2.0),
            vram_total_gb: Some(8.0),
            ..Default::default()
        });
        assert_eq!(reading.core_usage, Some(42.0));
        assert_eq!(reading.core_temperature, Some(61.0));
        assert_eq!(reading.memory_temperature, None);
        assert_eq!(reading.hotspot_temperature, None);
    }
}
