//! CPU metrics collection.

use std::time::Duration;

use sysinfo::{Components, CpuRefreshKind, RefreshKind, System};

use crate::core::monitor::snapshot::{sane, CpuReading};
use crate::platform::{classify, lhm};

/// Sampling window for the usage measurement: the shortest interval the
/// statistics library computes usage over. A larger window would smooth
/// measurement noise but adds that much latency to every snapshot.
const CPU_SAMPLE_WINDOW: Duration = sysinfo::MINIMUM_CPU_UPDATE_INTERVAL;

/// Component labels that belong to the processor rather than other dies.
const CPU_COMPONENT_LABELS: &[&str] = &["cpu", "coretemp", "k10temp", "package", "tctl", "core"];

/// SoCs that hide their clock from the generic sources; nominal peak
/// frequencies per family, used only as a last resort.
const MODEL_FREQUENCY_HINTS: &[(&str, f64)] = &[
    ("Apple M1", 3200.0),
    ("Apple M2", 3500.0),
    ("Apple M3", 4000.0),
];

/// A source of partial CPU readings. Sources run in precedence order and a
/// later source only fills keys the earlier ones left absent.
pub(crate) type CpuSource = Box<dyn FnMut() -> CpuReading + Send>;

/// Collects the `cpu` category. Never panics by contract; a failing source
/// degrades its keys to absent.
pub struct CpuCollector {
    sources: Vec<CpuSource>,
    base_frequency_mhz: Option<f64>,
}

impl CpuCollector {
    pub fn new() -> Self {
        let mut stats = SysinfoCpuStats::new();
        let sources: Vec<CpuSource> = vec![
            Box::new(|| classify::classify_cpu_sensors(&lhm::sensors_or_empty())),
            Box::new(move || stats.collect()),
            Box::new(|| CpuReading {
                temperature: shell_temperature(),
                ..Default::default()
            }),
        ];
        Self::with_parts(sources, base_frequency_mhz())
    }

    pub(crate) fn with_parts(sources: Vec<CpuSource>, base_frequency_mhz: Option<f64>) -> Self {
        Self {
            sources,
            base_frequency_mhz,
        }
    }

    pub fn collect(&mut self) -> CpuReading {
        let mut reading = CpuReading::default();
        for source in &mut self.sources {
            reading.fill_missing_from(source());
        }

        if reading.frequency.is_none() {
            reading.frequency = self.base_frequency_mhz;
        }
        if reading.frequency.is_none() {
            reading.frequency = model_frequency_hint(reading.cpu_model.as_deref());
        }

        reading
    }
}

impl Default for CpuCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Generic statistics source backed by sysinfo.
struct SysinfoCpuStats {
    system: System,
    components: Components,
}

impl SysinfoCpuStats {
    fn new() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::nothing().with_cpu(CpuRefreshKind::everything()),
        );
        Self {
            system,
            components: Components::new_with_refreshed_list(),
        }
    }

    fn collect(&mut self) -> CpuReading {
        CpuReading {
            usage: self.usage_percent(),
            temperature: self.thermal_zone_celsius(),
            frequency: self.frequency_mhz(),
            voltage: None,
            cpu_model: self.model_name(),
        }
    }

    /// Usage over two samples taken [`CPU_SAMPLE_WINDOW`] apart (blocking).
    fn usage_percent(&mut self) -> Option<f64> {
        self.system.refresh_cpu_usage();
        std::thread::sleep(CPU_SAMPLE_WINDOW);
        self.system.refresh_cpu_usage();
        sane(f64::from(self.system.global_cpu_usage()))
    }

    fn frequency_mhz(&mut self) -> Option<f64> {
        self.system
            .refresh_cpu_specifics(CpuRefreshKind::nothing().with_frequency());
        let frequency = self.system.cpus().first()?.frequency();
        (frequency > 0).then(|| frequency as f64)
    }

    /// Hottest CPU-related zone. Worst-case policy: throttling follows the
    /// hottest sensor, not the average.
    fn thermal_zone_celsius(&mut self) -> Option<f64> {
        self.components.refresh(true);
        self.components
            .iter()
            .filter(|component| {
                let label = component.label().to_ascii_lowercase();
                CPU_COMPONENT_LABELS.iter().any(|k| label.contains(k))
            })
            .filter_map(|component| component.temperature())
            .map(f64::from)
            .filter(|t| t.is_finite())
            .fold(None, |hottest: Option<f64>, t| {
                Some(hottest.map_or(t, |h| h.max(t)))
            })
    }

    fn model_name(&self) -> Option<String> {
        let brand = self.system.cpus().first()?.brand().trim().to_string();
        (!brand.is_empty()).then_some(brand)
    }
}

#[cfg(target_os = "linux")]
fn shell_temperature() -> Option<f64> {
    crate::platform::shell::sensors_cpu_temperature()
}

#[cfg(target_os = "macos")]
fn shell_temperature() -> Option<f64> {
    crate::platform::shell::ioreg_cpu_temperature()
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn shell_temperature() -> Option<f64> {
    None
}

/// Nominal base frequency, readable from CPUID on x86 only. Computed once
/// at collector construction.
fn base_frequency_mhz() -> Option<f64> {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        if let Some(info) = raw_cpuid::CpuId::new().get_processor_frequency_info() {
            let base = f64::from(info.processor_base_frequency());
            if base > 0.0 {
                return Some(base);
            }
        }
    }
    None
}

fn model_frequency_hint(model: Option<&str>) -> Option<f64> {
    let model = model?;
    MODEL_FREQUENCY_HINTS
        .iter()
        .find(|(pattern, _)| model.contains(pattern))
        .map(|(_, mhz)| *mhz)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(reading: CpuReading) -> CpuSource {
        Box::new(move || reading.clone())
    }

    #[test]
    fn generic_source_alone_fills_usage_and_frequency() {
        let source = fixed(CpuReading {
            usage: Some(42.5),
            frequency: Some(2400.0),
            ..Default::default()
        });
        let mut collector = CpuCollector::with_parts(vec![source], None);

        let reading = collector.collect();
        assert_eq!(reading.usage, Some(42.5));
        assert_eq!(reading.frequency, Some(2400.0));
        assert_eq!(reading.temperature, None);
        assert_eq!(reading.voltage, None);
    }

    #[test]
    fn earlier_source_wins_per_key() {
        let preferred = fixed(CpuReading {
            temperature: Some(61.0),
            ..Default::default()
        });
        let fallback = fixed(CpuReading {
            temperature: Some(40.0),
            usage: Some(15.0),
            ..Default::default()
        });
        let mut collector = CpuCollector::with_parts(vec![preferred, fallback], None);

        let reading = collector.collect();
        assert_eq!(reading.temperature, Some(61.0));
        assert_eq!(reading.usage, Some(15.0));
    }

    #[test]
    fn base_frequency_fills_in_when_no_source_reports_one() {
        let source = fixed(CpuReading {
            usage: Some(10.0),
            ..Default::default()
        });
        let mut collector = CpuCollector::with_parts(vec![source], Some(2900.0));

        assert_eq!(collector.collect().frequency, Some(2900.0));
    }

    #[test]
    fn base_frequency_never_overrides_a_measured_clock() {
        let source = fixed(CpuReading {
            frequency: Some(3504.0),
            ..Default::default()
        });
        let mut collector = CpuCollector::with_parts(vec![source], Some(2900.0));

        assert_eq!(collector.collect().frequency, Some(3504.0));
    }

    #[test]
    fn model_hint_is_the_last_resort_for_frequency() {
        let source = fixed(CpuReading {
            usage: Some(22.0),
            cpu_model: Some("Apple M2".to_string()),
            ..Default::default()
        });
        let mut collector = CpuCollector::with_parts(vec![source], None);

        let reading = collector.collect();
        assert_eq!(reading.frequency, Some(3500.0));
        assert_eq!(reading.cpu_model.as_deref(), Some("Apple M2"));
    }

    #[test]
    fn unknown_model_yields_no_frequency() {
        let source = fixed(CpuReading {
            cpu_model: Some("SiFive U74".to_string()),
            ..Default::default()
        });
        let mut collector = CpuCollector::with_parts(vec![source], None);

        assert_eq!(collector.collect().frequency, None);
    }
}
