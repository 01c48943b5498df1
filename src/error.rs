use std::io;
use thiserror::Error;

/// Custom error type for the hwglance crate
#[derive(Error, Debug)]
pub enum GlanceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Sensor query failed: {0}")]
    SensorQuery(String),

    #[error("GPU not available: {0}")]
    GpuNotAvailable(String),

    #[error("Metric collection failed: {0}")]
    MetricCollection(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for the hwglance crate
pub type Result<T> = std::result::Result<T, GlanceError>;

impl GlanceError {
    /// Create a sensor query error
    pub fn sensor_query<S: Into<String>>(msg: S) -> Self {
        GlanceError::SensorQuery(msg.into())
    }

    /// Create a GPU not available error
    pub fn gpu_not_available<S: Into<String>>(msg: S) -> Self {
        GlanceError::GpuNotAvailable(msg.into())
    }

    /// Create a metric collection error
    pub fn metric_collection<S: Into<String>>(msg: S) -> Self {
        GlanceError::MetricCollection(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        GlanceError::Other(msg.into())
    }
}
