//! LibreHardwareMonitor sensor access.
//!
//! When the LibreHardwareMonitor service runs it publishes every sensor it
//! knows through the `root\LibreHardwareMonitor` WMI namespace. The
//! namespace is re-checked on every query: the service can start or stop at
//! any time, and a failed open is cheap.

use crate::error::Result;
use crate::platform::classify::HwSensor;

#[cfg(windows)]
pub fn query_sensors() -> Result<Vec<HwSensor>> {
    use crate::error::GlanceError;
    use serde::Deserialize;
    use wmi::{COMLibrary, WMIConnection};

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Sensor {
        name: String,
        sensor_type: String,
        value: f32,
        identifier: String,
    }

    let com = COMLibrary::new()
        .map_err(|e| GlanceError::sensor_query(format!("COM init failed: {e}")))?;
    let conn = WMIConnection::with_namespace_path("root\\LibreHardwareMonitor", com)
        .map_err(|e| GlanceError::sensor_query(format!("namespace open failed: {e}")))?;

    let sensors: Vec<Sensor> = conn
        .raw_query("SELECT Name, SensorType, Value, Identifier FROM Sensor")
        .map_err(|e| GlanceError::sensor_query(format!("sensor query failed: {e}")))?;

    Ok(sensors
        .into_iter()
        .map(|s| HwSensor {
            name: s.name,
            sensor_type: s.sensor_type,
            value: f64::from(s.value),
            identifier: s.identifier,
        })
        .collect())
}

#[cfg(not(windows))]
pub fn query_sensors() -> Result<Vec<HwSensor>> {
    Ok(Vec::new())
}

/// Query sensors, treating an unreachable namespace as an empty sensor list.
pub fn sensors_or_empty() -> Vec<HwSensor> {
    match query_sensors() {
        Ok(sensors) => sensors,
        Err(e) => {
            log::debug!("hardware-monitor sensors unavailable: {e}");
            Vec::new()
        }
    }
}
