use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum SensorError {
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Lat/Long incorrect: {0}")]
    InvalidCoordinates(String),

    #[error("Thresholds of sensor {sensor} are not correctly configured: {reason}")]
    InvalidThresholds { sensor: String, reason: String },

    #[error("Sensor name must not be empty")]
    MissingSensorName,

    #[error("Sensor {0} is configured more than once")]
    DuplicateSensor(String),

    #[error("Solar position calculation failed: {0}")]
    SolarPosition(#[from] solar_positioning::Error),

    #[error("MQTT client error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SensorError>;
