//! Decide whether the sun currently stands inside a sensor's window.

use super::position::{Coordinates, SunObservation, observe};
use super::window::{AltitudeWindow, AzimuthWindow};
use chrono::{DateTime, Utc};
use log::{debug, error};

/// Evaluate the sun position at `now` against the given windows.
///
/// Returns `false` when no valid coordinates are available or the sun
/// position cannot be computed.
pub fn evaluate(
    name: &str,
    now: DateTime<Utc>,
    coords: Option<&Coordinates>,
    azimuth: AzimuthWindow,
    altitude: AltitudeWindow,
) -> bool {
    let Some(coords) = coords else {
        error!("[Sensor] {}: Lat/Long incorrect, reporting closed", name);
        return false;
    };

    let observation = match observe(now, coords) {
        Ok(observation) => observation,
        Err(e) => {
            error!("[Sensor] {}: {}, reporting closed", name, e);
            return false;
        }
    };
    debug!(
        "[Sensor] {}: Current azimuth: {:.2}°, altitude: {:.2}°",
        name, observation.azimuth, observation.altitude
    );

    window_contains(&observation, azimuth, altitude)
}

/// Pure window test, including the wraparound corrections for azimuth
/// thresholds below 0 or above 360.
pub fn window_contains(
    observation: &SunObservation,
    azimuth: AzimuthWindow,
    altitude: AltitudeWindow,
) -> bool {
    let window = azimuth.normalized();
    let inside = |azimuth: f64| window.contains(azimuth) && altitude.contains(observation.altitude);

    let mut visible = inside(observation.azimuth);

    if window.lower < 0.0 && !visible {
        visible = inside(-(360.0 - observation.azimuth));
    }

    if window.upper > 360.0 && !visible {
        visible = inside(observation.azimuth + 360.0);
    }

    visible
}
