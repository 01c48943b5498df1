// Platform-specific code module

pub mod classify;
pub mod lhm;
pub mod nvml;
pub mod shell;

// Re-exports para imports limpios
pub use classify::{HwSensor, SensorKind};
pub use nvml::NvmlHandle;
