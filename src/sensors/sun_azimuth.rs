//! A contact sensor driven by the sun position.

use super::ContactSensor;
use crate::config::SensorConfig;
use crate::error::{Result, SensorError};
use crate::sun::{self, AltitudeWindow, AzimuthWindow, Coordinates};
use crate::weather::{self, WeatherObservation, WeatherSettings};
use chrono::{DateTime, Utc};

/// One configured sensor: its windows, weather settings, and current state.
pub struct SunAzimuthSensor {
    name: String,
    azimuth: AzimuthWindow,
    altitude: AltitudeWindow,
    weather: WeatherSettings,
    state: ContactSensor,
}

impl SunAzimuthSensor {
    /// Validate `config` and build the sensor. Starts closed.
    pub fn from_config(config: &SensorConfig, weather: WeatherSettings) -> Result<Self> {
        let name = config.name.trim();
        if name.is_empty() {
            return Err(SensorError::MissingSensorName);
        }
        let invalid = |reason: String| SensorError::InvalidThresholds {
            sensor: name.to_string(),
            reason,
        };

        let azimuth = AzimuthWindow::from_config(config.lower_threshold, config.upper_threshold)
            .map_err(invalid)?;
        let lower_altitude = config
            .lower_altitude_threshold
            .value("lowerAltitudeThreshold")
            .map_err(invalid)?;
        let upper_altitude = config
            .upper_altitude_threshold
            .value("upperAltitudeThreshold")
            .map_err(invalid)?;
        let altitude =
            AltitudeWindow::from_config(lower_altitude, upper_altitude).map_err(invalid)?;

        Ok(Self {
            name: name.to_string(),
            azimuth,
            altitude,
            weather,
            state: ContactSensor::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn azimuth(&self) -> AzimuthWindow {
        self.azimuth
    }

    pub fn altitude(&self) -> AltitudeWindow {
        self.altitude
    }

    /// Shared state, for wiring notifiers and reading the last result.
    pub fn state(&self) -> &ContactSensor {
        &self.state
    }

    /// Model string shown to users, e.g. `Azimuth 90-250`.
    pub fn model(&self) -> String {
        format!("Azimuth {}-{}", self.azimuth.lower, self.azimuth.upper)
    }

    /// Derive the state from scratch for `now`. Does not store it.
    pub fn evaluate(
        &self,
        now: DateTime<Utc>,
        coords: Option<&Coordinates>,
        observation: Option<&WeatherObservation>,
    ) -> bool {
        let sun_is_up = sun::evaluate(&self.name, now, coords, self.azimuth, self.altitude);
        weather::gate(&self.name, sun_is_up, observation, &self.weather)
    }

    /// Evaluate and store the result. Returns the new state.
    pub fn update(
        &self,
        now: DateTime<Utc>,
        coords: Option<&Coordinates>,
        observation: Option<&WeatherObservation>,
    ) -> bool {
        let open = self.evaluate(now, coords, observation);
        if self.state.set(open) {
            log::info!(
                "[Sensor] {}: {}",
                self.name,
                if open { "open (sun in range)" } else { "closed" }
            );
        }
        open
    }
}
