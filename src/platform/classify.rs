//! Sensor classification tables.
//!
//! Hardware-monitor namespaces expose flat lists of named, typed sensors.
//! This module maps those records onto metric keys using literal ordered
//! pattern tables so the matching policy stays auditable. Matching is
//! first-match-wins: tiers in declared order, patterns within a tier in
//! declared order, sensors within a pattern in enumeration order. Name
//! comparisons are ASCII-case-insensitive.

use crate::core::monitor::snapshot::{sane, CpuReading, GpuReading};

/// One sensor record as exposed by the hardware-monitor namespace.
#[derive(Debug, Clone)]
pub struct HwSensor {
    pub name: String,
    pub sensor_type: String,
    pub value: f64,
    /// Hardware instance path, e.g. `/nvidiagpu/0/temperature/0`
    pub identifier: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Temperature,
    Voltage,
    Clock,
    Load,
    Fan,
    Data,
    Other,
}

impl SensorKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Temperature" => SensorKind::Temperature,
            "Voltage" => SensorKind::Voltage,
            "Clock" => SensorKind::Clock,
            "Load" => SensorKind::Load,
            "Fan" => SensorKind::Fan,
            "Data" => SensorKind::Data,
            _ => SensorKind::Other,
        }
    }
}

impl HwSensor {
    fn kind(&self) -> SensorKind {
        SensorKind::parse(&self.sensor_type)
    }
}

fn name_contains(name: &str, pattern: &str) -> bool {
    name.to_ascii_uppercase()
        .contains(&pattern.to_ascii_uppercase())
}

/// First sensor of the given kind whose name matches a pattern, scanning
/// tiers and patterns in priority order.
fn find_value(sensors: &[&HwSensor], kind: SensorKind, tiers: &[&[&str]]) -> Option<f64> {
    for tier in tiers {
        for pattern in *tier {
            for sensor in sensors {
                if sensor.kind() == kind && name_contains(&sensor.name, pattern) {
                    if let Some(value) = sane(sensor.value) {
                        return Some(value);
                    }
                }
            }
        }
    }
    None
}

// CPU tables: specific package/core sensors outrank the generic "CPU" match.
const CPU_TEMPERATURE: &[&[&str]] = &[&["CPU Package", "Core (Tctl/Tdie)"], &["CPU"]];
const CPU_VOLTAGE: &[&[&str]] = &[&["CPU Core", "CPU VCORE"], &["CPU"]];
const CPU_CLOCK: &[&[&str]] = &[&["CPU Core #1"], &["CPU"]];
const CPU_LOAD: &[&[&str]] = &[&["CPU Total"]];

/// Classify hardware-monitor sensors into a partial CPU reading.
pub fn classify_cpu_sensors(sensors: &[HwSensor]) -> CpuReading {
    let all: Vec<&HwSensor> = sensors.iter().collect();
    CpuReading {
        usage: find_value(&all, SensorKind::Load, CPU_LOAD),
        temperature: find_value(&all, SensorKind::Temperature, CPU_TEMPERATURE),
        frequency: find_value(&all, SensorKind::Clock, CPU_CLOCK),
        voltage: find_value(&all, SensorKind::Voltage, CPU_VOLTAGE),
        cpu_model: None,
    }
}

// GPU relevance: the instance path is more reliable than the display name,
// which is only consulted when the path gives no verdict.
const GPU_IDENTIFIER_PATHS: &[&str] = &["/nvidiagpu/", "/amdgpu/", "/intelgpu/"];
const GPU_NAME_KEYWORDS: &[&str] = &["GPU", "NVIDIA", "AMD", "RADEON", "INTEL GRAPHICS"];

fn is_gpu_sensor(sensor: &HwSensor) -> bool {
    let identifier = sensor.identifier.to_ascii_lowercase();
    if GPU_IDENTIFIER_PATHS.iter().any(|p| identifier.contains(p)) {
        return true;
    }
    GPU_NAME_KEYWORDS.iter().any(|k| name_contains(&sensor.name, k))
}

const GPU_CORE_TEMPERATURE: &[&[&str]] = &[&["GPU Core"]];
const GPU_MEMORY_TEMPERATURE: &[&[&str]] = &[&["GPU Memory"]];
const GPU_HOTSPOT_TEMPERATURE: &[&[&str]] = &[&["GPU Hot Spot"]];
const GPU_CORE_LOAD: &[&[&str]] = &[&["GPU Core"], &["GPU D3D 3D"]];
const GPU_MEMORY_LOAD: &[&[&str]] = &[&["GPU Memory Controller"]];
const GPU_CORE_CLOCK: &[&[&str]] = &[&["GPU Core"]];
const GPU_MEMORY_CLOCK: &[&[&str]] = &[&["GPU Memory"]];
const GPU_FAN: &[&[&str]] = &[&["GPU"], &["Fan"]];

/// Classify hardware-monitor sensors into a partial GPU reading.
///
/// VRAM sizes in GB have no sensor representation here; they come from the
/// vendor telemetry or tool fallbacks.
pub fn classify_gpu_sensors(sensors: &[HwSensor]) -> GpuReading {
    let gpu: Vec<&HwSensor> = sensors.iter().filter(|s| is_gpu_sensor(s)).collect();
    GpuReading {
        core_usage: find_value(&gpu, SensorKind::Load, GPU_CORE_LOAD),
        core_temperature: find_value(&gpu, SensorKind::Temperature, GPU_CORE_TEMPERATURE),
        core_frequency: find_value(&gpu, SensorKind::Clock, GPU_CORE_CLOCK),
        memory_frequency: find_value(&gpu, SensorKind::Clock, GPU_MEMORY_CLOCK),
        memory_temperature: find_value(&gpu, SensorKind::Temperature, GPU_MEMORY_TEMPERATURE),
        hotspot_temperature: find_value(&gpu, SensorKind::Temperature, GPU_HOTSPOT_TEMPERATURE),
        vram_usage_percent: find_value(&gpu, SensorKind::Load, GPU_MEMORY_LOAD),
        vram_used_gb: None,
        vram_total_gb: None,
        fan_speed: find_value(&gpu, SensorKind::Fan, GPU_FAN),
    }
}

const RAM_TEMPERATURE_KEYWORDS: &[&str] = &["RAM", "Memory"];

/// First temperature sensor named like a memory module. GPU sensors are
/// excluded so "GPU Memory" junction sensors cannot shadow the DIMMs.
pub fn ram_temperature(sensors: &[HwSensor]) -> Option<f64> {
    sensors
        .iter()
        .find(|s| {
            s.kind() == SensorKind::Temperature
                && !is_gpu_sensor(s)
                && RAM_TEMPERATURE_KEYWORDS
                    .iter()
                    .any(|k| name_contains(&s.name, k))
        })
        .and_then(|s| sane(s.value))
}

const NETWORK_IDENTIFIER_KEYWORDS: &[&str] = &["networkadapter", "network", "ethernet", "wi-fi", "wlan"];
const UPLOAD_KEYWORDS: &[&str] = &["upload", "sent"];
const DOWNLOAD_KEYWORDS: &[&str] = &["download", "received", "recv"];

/// Sum of the "Data" counters on network adapters as (sent, received), in GB
/// as the namespace reports them.
pub fn network_totals(sensors: &[HwSensor]) -> Option<(f64, f64)> {
    let mut sent = 0.0;
    let mut received = 0.0;
    let mut found = false;

    for sensor in sensors {
        if sensor.kind() != SensorKind::Data {
            continue;
        }
        let identifier = sensor.identifier.to_ascii_lowercase();
        if !NETWORK_IDENTIFIER_KEYWORDS.iter().any(|k| identifier.contains(k)) {
            continue;
        }
        let name = sensor.name.to_ascii_lowercase();
        let Some(value) = sane(sensor.value) else {
            continue;
        };
        if UPLOAD_KEYWORDS.iter().any(|k| name.contains(k)) {
            sent += value;
            found = true;
        } else if DOWNLOAD_KEYWORDS.iter().any(|k| name.contains(k)) {
            received += value;
            found = true;
        }
    }

    found.then_some((sent, received))
}
