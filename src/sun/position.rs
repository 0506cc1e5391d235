//! Instantaneous sun position.
//!
//! Thin adapter over the NREL solar position algorithm from
//! `solar_positioning`. Refraction is not applied, so the altitude is the
//! geometric angle above the horizon.

use crate::error::{Result as SensorResult, SensorError};
use chrono::{DateTime, Datelike, Utc};
use solar_positioning::{spa, time::DeltaT};

/// Observer height above sea level. Parallax from a few hundred meters is
/// far below threshold resolution.
const ELEVATION_METERS: f64 = 0.0;

/// Observer location in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Build coordinates from optional configuration values.
    ///
    /// Both values must be present, finite, and within their geographic range.
    pub fn new(latitude: Option<f64>, longitude: Option<f64>) -> Result<Self, SensorError> {
        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            return Err(SensorError::InvalidCoordinates(
                "lat and long must both be configured as numbers".to_string(),
            ));
        };
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(SensorError::InvalidCoordinates(format!(
                "latitude {latitude} is outside [-90, 90]"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(SensorError::InvalidCoordinates(format!(
                "longitude {longitude} is outside [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Sun position as seen from a location on the ground.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunObservation {
    /// Compass bearing, clockwise from north, in [0, 360).
    pub azimuth: f64,
    /// Angle above the horizon in degrees (negative at night).
    pub altitude: f64,
}

/// Compute the sun's azimuth and altitude at `at` for `coords`.
pub fn observe(at: DateTime<Utc>, coords: &Coordinates) -> SensorResult<SunObservation> {
    let delta_t = DeltaT::estimate_from_date(at.year(), at.month())?;
    let position = spa::solar_position(
        at,
        coords.latitude,
        coords.longitude,
        ELEVATION_METERS,
        delta_t,
        None,
    )?;

    Ok(SunObservation {
        azimuth: position.azimuth().rem_euclid(360.0),
        altitude: position.elevation_angle(),
    })
}
