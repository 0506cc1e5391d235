//! Weather gating of the sun-position result.

use super::WeatherObservation;
use log::debug;

/// Weather settings that apply to one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeatherSettings {
    /// `enableWeatherIntegration` from the platform config.
    pub enabled: bool,
    /// Whether an API key is configured at all.
    pub has_api_key: bool,
    /// Highest cloud cover (percent) still considered sunny.
    pub highest_acceptable_overcast: Option<f64>,
    /// Temperature that must be exceeded for the sun to count.
    pub minimum_sunny_temperature: Option<f64>,
}

/// Narrow `sun_is_up` using the latest cached observation.
///
/// Weather can only turn an open result closed, never the other way round.
/// Without a cached observation the result is left unchanged.
pub fn gate(
    name: &str,
    sun_is_up: bool,
    observation: Option<&WeatherObservation>,
    settings: &WeatherSettings,
) -> bool {
    if !sun_is_up || !settings.has_api_key {
        return sun_is_up;
    }

    let Some(weather) = observation else {
        debug!("[Weather] {}: No weather data cached yet, keeping state", name);
        return sun_is_up;
    };

    if !settings.enabled {
        debug!(
            "[Weather] {}: Temperature: {}°C, overcast: {}% (integration disabled)",
            name, weather.temperature_celsius, weather.overcast
        );
        return sun_is_up;
    }

    let overcast_acceptable = settings
        .highest_acceptable_overcast
        .is_none_or(|max| weather.overcast <= max);
    let warm_enough = settings
        .minimum_sunny_temperature
        .is_none_or(|min| weather.temperature_celsius > min);
    let state = overcast_acceptable && warm_enough;

    debug!(
        "[Weather] {}: Temperature: {}°C, overcast: {}% => {} (overcast ok: {}, warm enough: {})",
        name,
        weather.temperature_celsius,
        weather.overcast,
        state,
        overcast_acceptable,
        warm_enough
    );

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn observation(overcast: f64, temperature_celsius: f64) -> WeatherObservation {
        WeatherObservation {
            overcast,
            temperature_celsius,
            fetched_at: Utc::now(),
        }
    }

    fn enabled() -> WeatherSettings {
        WeatherSettings {
            enabled: true,
            has_api_key: true,
            highest_acceptable_overcast: Some(50.0),
            minimum_sunny_temperature: Some(5.0),
        }
    }

    #[test]
    fn test_never_opens_a_closed_result() {
        let settings = enabled();
        for weather in [observation(0.0, 30.0), observation(100.0, -10.0)] {
            assert!(!gate("t", false, Some(&weather), &settings));
        }
        assert!(!gate("t", false, None, &settings));
        assert!(!gate("t", false, None, &WeatherSettings::default()));
    }

    #[test]
    fn test_disabled_integration_passes_through() {
        let settings = WeatherSettings {
            enabled: false,
            ..enabled()
        };
        let overcast = observation(100.0, -10.0);
        assert!(gate("t", true, Some(&overcast), &settings));
    }

    #[test]
    fn test_missing_api_key_passes_through() {
        let settings = WeatherSettings {
            has_api_key: false,
            ..enabled()
        };
        assert!(gate("t", true, Some(&observation(100.0, -10.0)), &settings));
    }

    #[test]
    fn test_no_cached_observation_passes() {
        assert!(gate("t", true, None, &enabled()));
    }

    #[test]
    fn test_overcast_threshold_is_inclusive() {
        let settings = enabled();
        assert!(gate("t", true, Some(&observation(50.0, 20.0)), &settings));
        assert!(!gate("t", true, Some(&observation(50.5, 20.0)), &settings));
    }

    #[test]
    fn test_temperature_must_exceed_minimum() {
        let settings = enabled();
        assert!(!gate("t", true, Some(&observation(10.0, 5.0)), &settings));
        assert!(gate("t", true, Some(&observation(10.0, 5.1)), &settings));
    }

    #[test]
    fn test_overcast_only_when_no_minimum_temperature() {
        let settings = WeatherSettings {
            minimum_sunny_temperature: None,
            ..enabled()
        };
        assert!(gate("t", true, Some(&observation(10.0, -20.0)), &settings));
        assert!(!gate("t", true, Some(&observation(90.0, -20.0)), &settings));
    }
}
