//! NVIDIA telemetry via NVML.

use crate::core::monitor::snapshot::GpuReading;
#[cfg(feature = "nvml")]
use crate::core::monitor::snapshot::{sane, BYTES_PER_GIB};

#[cfg(feature = "nvml")]
use nvml_wrapper::{
    enum_wrappers::device::{Clock, TemperatureSensor},
    Nvml,
};
#[cfg(feature = "nvml")]
use once_cell::sync::Lazy;

/// Singleton - NVML must be initialized ONCE only
#[cfg(feature = "nvml")]
static NVML: Lazy<Option<Nvml>> = Lazy::new(|| Nvml::init().ok());

/// Handle to the vendor telemetry for the primary adapter, probed once per
/// process. A failed probe is permanent: the driver will not appear mid-run
/// and re-initializing NVML every cycle is expensive.
#[derive(Debug, Clone, Copy)]
pub enum NvmlHandle {
    Available { device_index: u32 },
    Unavailable,
}

impl NvmlHandle {
    /// Probe the library and the primary adapter at index 0.
    pub fn probe() -> Self {
        #[cfg(feature = "nvml")]
        {
            match NVML.as_ref() {
                Some(nvml) => match nvml.device_by_index(0) {
                    Ok(_) => return NvmlHandle::Available { device_index: 0 },
                    Err(e) => log::debug!("NVML adapter 0 unavailable: {e}"),
                },
                None => log::debug!("NVML not available (driver missing or no permission)"),
            }
        }
        NvmlHandle::Unavailable
    }

    pub fn is_available(&self) -> bool {
        matches!(self, NvmlHandle::Available { .. })
    }

    /// Read every metric NVML exposes for the adapter. Each field may fail
    /// independently without invalidating the rest.
    pub fn read(&self) -> GpuReading {
        #[cfg(feature = "nvml")]
        if let NvmlHandle::Available { device_index } = self {
            return read_device(*device_index);
        }
        GpuReading::default()
    }
}

#[cfg(feature = "nvml")]
fn read_device(device_index: u32) -> GpuReading {
    let mut reading = GpuReading::default();

    let Some(nvml) = NVML.as_ref() else {
        return reading;
    };
    let device = match nvml.device_by_index(device_index) {
        Ok(device) => device,
        Err(e) => {
            log::warn!("NVML device read failed: {e}");
            return reading;
        }
    };

    reading.core_temperature = device
        .temperature(TemperatureSensor::Gpu)
        .ok()
        .map(f64::from);
    reading.core_usage = device.utilization_rates().ok().map(|u| f64::from(u.gpu));
    reading.core_frequency = device.clock_info(Clock::Graphics).ok().map(f64::from);
    reading.memory_frequency = device.clock_info(Clock::Memory).ok().map(f64::from);

    if let Ok(memory) = device.memory_info() {
        reading.vram_used_gb = sane(memory.used as f64 / BYTES_PER_GIB);
        reading.vram_total_gb = sane(memory.total as f64 / BYTES_PER_GIB);
        if memory.total > 0 {
            reading.vram_usage_percent = sane(memory.used as f64 / memory.total as f64 * 100.0);
        }
    }

    reading.fan_speed = device.fan_speed(0).ok().map(f64::from);

    reading
}
