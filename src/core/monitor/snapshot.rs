use serde::{Deserialize, Serialize};

pub(crate) const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;
pub(crate) const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Complete point-in-time result of polling all hardware categories.
///
/// Every metric key a category defines is always present; a key whose value
/// no source could supply this cycle carries `None` and serializes as `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub timestamp: i64, // Unix timestamp
    pub cpu: CpuReading,
    pub gpu: GpuReading,
    pub ram: RamReading,
    pub network: NetworkReading,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuReading {
    /// Usage percentage over a short sampling window
    pub usage: Option<f64>,
    /// Package temperature in °C
    pub temperature: Option<f64>,
    /// Current clock in MHz
    pub frequency: Option<f64>,
    /// Core voltage in V
    pub voltage: Option<f64>,
    /// Processor brand string
    pub cpu_model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuReading {
    pub core_usage: Option<f64>,
    pub core_temperature: Option<f64>,
    pub core_frequency: Option<f64>,
    pub memory_frequency: Option<f64>,
    pub memory_temperature: Option<f64>,
    pub hotspot_temperature: Option<f64>,
    pub vram_usage_percent: Option<f64>,
    pub vram_used_gb: Option<f64>,
    pub vram_total_gb: Option<f64>,
    /// Fan speed percentage
    pub fan_speed: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RamReading {
    /// Total RAM in GB
    pub total: Option<f64>,
    /// Used RAM in GB
    pub used: Option<f64>,
    /// Available RAM in GB
    pub available: Option<f64>,
    /// Usage percentage
    pub percent: Option<f64>,
    /// Module temperature in °C
    pub ram_temperature: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkReading {
    /// Upload speed in MB/s since the previous collection
    pub upload_speed: Option<f64>,
    /// Download speed in MB/s since the previous collection
    pub download_speed: Option<f64>,
    /// Cumulative bytes sent, in GB
    pub total_sent: Option<f64>,
    /// Cumulative bytes received, in GB
    pub total_received: Option<f64>,
}

/// Treat NaN and infinite values as unavailable.
pub(crate) fn sane(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

impl CpuReading {
    /// Fill keys still absent from a lower-precedence source.
    pub fn fill_missing_from(&mut self, other: CpuReading) {
        fill(&mut self.usage, other.usage);
        fill(&mut self.temperature, other.temperature);
        fill(&mut self.frequency, other.frequency);
        fill(&mut self.voltage, other.voltage);
        fill(&mut self.cpu_model, other.cpu_model);
    }
}

impl GpuReading {
    /// Fill keys still absent from a lower-precedence source.
    pub fn fill_missing_from(&mut self, other: GpuReading) {
        fill(&mut self.core_usage, other.core_usage);
        fill(&mut self.core_temperature, other.core_temperature);
        fill(&mut self.core_frequency, other.core_frequency);
        fill(&mut self.memory_frequency, other.memory_frequency);
        fill(&mut self.memory_temperature, other.memory_temperature);
        fill(&mut self.hotspot_temperature, other.hotspot_temperature);
        fill(&mut self.vram_usage_percent, other.vram_usage_percent);
        fill(&mut self.vram_used_gb, other.vram_used_gb);
        fill(&mut self.vram_total_gb, other.vram_total_gb);
        fill(&mut self.fan_speed, other.fan_speed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_missing_never_overwrites() {
        let mut reading = CpuReading {
            usage: Some(12.0),
            ..Default::default()
        };
        reading.fill_missing_from(CpuReading {
            usage: Some(99.0),
            frequency: Some(2400.0),
            ..Default::default()
        });

        assert_eq!(reading.usage, Some(12.0));
        assert_eq!(reading.frequency, Some(2400.0));
    }

    #[test]
    fn absent_keys_serialize_as_null() {
        let snapshot = MetricSnapshot::default();
        let value = serde_json::to_value(&snapshot).unwrap();

        assert!(value["cpu"]["voltage"].is_null());
        assert!(value["gpu"]["hotspot_temperature"].is_null());
        assert!(value["network"]["upload_speed"].is_null());
    }

    #[test]
    fn sane_rejects_nan_and_infinities() {
        assert_eq!(sane(42.5), Some(42.5));
        assert_eq!(sane(-3.0), Some(-3.0));
        assert_eq!(sane(f64::NAN), None);
        assert_eq!(sane(f64::INFINITY), None);
        assert_eq!(sane(f64::NEG_INFINITY), None);
    }
}
