//! Runtime configuration.
//!
//! The file is a JSON platform block (`lat`, `long`, `apikey`, `sensors`,
//! ...). Environment variables override the platform-level values after
//! the file is parsed.

use crate::error::{Result, SensorError};
use crate::sun::Coordinates;
use crate::weather::WeatherSettings;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_WEATHER_UPDATE_SECS: u64 = 300;
pub const DEFAULT_SENSOR_POLL_MILLIS: u64 = 10_007;
pub const DEFAULT_MQTT_PORT: u16 = 1883;
pub const DEFAULT_MQTT_CLIENT_ID: &str = "sun-azimuth-sensor";
pub const DEFAULT_MQTT_TOPIC_PREFIX: &str = "sun-azimuth";

/// Split a `.env` line into key and value.
///
/// Handles values with spaces without requiring quotes and strips one pair
/// of surrounding quotes.
fn parse_dotenv_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let mut value = value.trim();
    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        value = &value[1..value.len() - 1];
    }
    Some((key, value))
}

/// Load environment variables from a `.env` file if it exists.
///
/// Variables already present in the process environment take precedence.
/// Returns how many variables were set.
pub fn load_dotenv(path: &Path) -> usize {
    let Ok(content) = fs::read_to_string(path) else {
        return 0;
    };

    let mut loaded = 0;
    for (key, value) in content.lines().filter_map(parse_dotenv_line) {
        if std::env::var_os(key).is_none() {
            // SAFETY: called from main before the runtime spawns any threads
            unsafe { std::env::set_var(key, value) };
            loaded += 1;
        }
    }
    loaded
}

/// Accept any JSON value for a numeric field; anything that is not a number
/// is treated as absent so a single bad field cannot take down the file.
fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()))
}

/// Optional numeric field that must be a number when present.
///
/// Unlike [`lenient_number`] fields, a non-numeric value is kept so the
/// owner can reject it instead of falling back to a default.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum NumberField {
    #[default]
    Absent,
    Number(f64),
    Invalid(serde_json::Value),
}

impl NumberField {
    /// The configured number, `None` when absent, or an error naming `label`.
    pub fn value(&self, label: &str) -> std::result::Result<Option<f64>, String> {
        match self {
            NumberField::Absent => Ok(None),
            NumberField::Number(v) => Ok(Some(*v)),
            NumberField::Invalid(raw) => Err(format!("{label} must be a number, got {raw}")),
        }
    }
}

impl From<f64> for NumberField {
    fn from(value: f64) -> Self {
        NumberField::Number(value)
    }
}

impl<'de> Deserialize<'de> for NumberField {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
            None | Some(serde_json::Value::Null) => NumberField::Absent,
            Some(value) => match value.as_f64() {
                Some(v) => NumberField::Number(v),
                None => NumberField::Invalid(value),
            },
        })
    }
}

impl Serialize for NumberField {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            NumberField::Absent => serializer.serialize_none(),
            NumberField::Number(v) => serializer.serialize_f64(*v),
            NumberField::Invalid(raw) => raw.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default, deserialize_with = "lenient_number")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub long: Option<f64>,
    /// OpenWeatherMap API key. Weather is only fetched when this is set.
    #[serde(default)]
    pub apikey: Option<String>,
    #[serde(default)]
    pub enable_weather_integration: bool,
    #[serde(default, deserialize_with = "lenient_number")]
    pub highest_acceptable_overcast: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub weather_update_interval_seconds: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub sensor_poll_interval_millis: Option<f64>,
    #[serde(default)]
    pub weather_api_base_url: Option<String>,
    #[serde(default)]
    pub debug_log: bool,
    #[serde(default)]
    pub mqtt: Option<MqttConfig>,
    #[serde(default)]
    pub sensors: Vec<SensorConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub lower_threshold: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub upper_threshold: Option<f64>,
    #[serde(default)]
    pub lower_altitude_threshold: NumberField,
    #[serde(default)]
    pub upper_altitude_threshold: NumberField,
    #[serde(
        default,
        alias = "minimumTemperatureCelsuisConsideredSunny",
        deserialize_with = "lenient_number"
    )]
    pub minimum_temperature_celsius_considered_sunny: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MqttConfig {
    pub broker_host: String,
    #[serde(default = "default_mqtt_port")]
    pub broker_port: u16,
    #[serde(default = "default_mqtt_client_id")]
    pub client_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_mqtt_topic_prefix")]
    pub topic_prefix: String,
}

fn default_mqtt_port() -> u16 {
    DEFAULT_MQTT_PORT
}

fn default_mqtt_client_id() -> String {
    DEFAULT_MQTT_CLIENT_ID.to_string()
}

fn default_mqtt_topic_prefix() -> String {
    DEFAULT_MQTT_TOPIC_PREFIX.to_string()
}

impl MqttConfig {
    pub fn new(broker_host: impl Into<String>) -> Self {
        Self {
            broker_host: broker_host.into(),
            broker_port: DEFAULT_MQTT_PORT,
            client_id: default_mqtt_client_id(),
            username: None,
            password: None,
            topic_prefix: default_mqtt_topic_prefix(),
        }
    }

    /// Client id to connect with. Blank ids fall back to the default, and
    /// surrounding whitespace is dropped since the broker client rejects it.
    pub fn effective_client_id(&self) -> &str {
        match self.client_id.trim() {
            "" => DEFAULT_MQTT_CLIENT_ID,
            id => id,
        }
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes")
}

impl Config {
    /// Read the config file at `path` and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| SensorError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config =
            serde_json::from_str(&content).map_err(|source| SensorError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.apply_env();
        Ok(config)
    }

    /// Override platform-level values from the process environment.
    pub fn apply_env(&mut self) {
        if let Ok(lat) = std::env::var("SUN_LAT")
            && let Ok(v) = lat.trim().parse()
        {
            self.lat = Some(v);
        }
        if let Ok(long) = std::env::var("SUN_LONG")
            && let Ok(v) = long.trim().parse()
        {
            self.long = Some(v);
        }
        if let Ok(key) = std::env::var("OPENWEATHER_API_KEY") {
            self.apikey = Some(key);
        }
        if let Ok(flag) = std::env::var("ENABLE_WEATHER_INTEGRATION") {
            self.enable_weather_integration = parse_flag(&flag);
        }
        if let Ok(overcast) = std::env::var("HIGHEST_ACCEPTABLE_OVERCAST")
            && let Ok(v) = overcast.trim().parse()
        {
            self.highest_acceptable_overcast = Some(v);
        }
        if let Ok(secs) = std::env::var("WEATHER_UPDATE_INTERVAL_SECS")
            && let Ok(v) = secs.trim().parse()
        {
            self.weather_update_interval_seconds = Some(v);
        }
        if let Ok(flag) = std::env::var("DEBUG_LOG") {
            self.debug_log = parse_flag(&flag);
        }

        // MQTT configuration
        if let Ok(host) = std::env::var("MQTT_BROKER_HOST") {
            match self.mqtt.as_mut() {
                Some(mqtt) => mqtt.broker_host = host,
                None => self.mqtt = Some(MqttConfig::new(host)),
            }
        }
        let Some(mqtt) = self.mqtt.as_mut() else {
            return;
        };
        if let Ok(port) = std::env::var("MQTT_BROKER_PORT")
            && let Ok(p) = port.trim().parse()
        {
            mqtt.broker_port = p;
        }
        if let Ok(client_id) = std::env::var("MQTT_CLIENT_ID") {
            mqtt.client_id = client_id;
        }
        if let Ok(username) = std::env::var("MQTT_USERNAME") {
            mqtt.username = Some(username);
        }
        if let Ok(password) = std::env::var("MQTT_PASSWORD") {
            mqtt.password = Some(password);
        }
        if let Ok(prefix) = std::env::var("MQTT_TOPIC_PREFIX") {
            mqtt.topic_prefix = prefix;
        }
    }

    pub fn coordinates(&self) -> Result<Coordinates> {
        Coordinates::new(self.lat, self.long)
    }

    /// The API key, if one is configured and not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.apikey
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn weather_update_interval(&self) -> Duration {
        positive(self.weather_update_interval_seconds)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(Duration::from_secs(DEFAULT_WEATHER_UPDATE_SECS))
    }

    pub fn sensor_poll_interval(&self) -> Duration {
        positive(self.sensor_poll_interval_millis)
            .and_then(|ms| Duration::try_from_secs_f64(ms / 1000.0).ok())
            .unwrap_or(Duration::from_millis(DEFAULT_SENSOR_POLL_MILLIS))
    }

    /// Weather gate settings for one sensor.
    pub fn weather_settings(&self, sensor: &SensorConfig) -> WeatherSettings {
        WeatherSettings {
            enabled: self.enable_weather_integration,
            has_api_key: self.api_key().is_some(),
            highest_acceptable_overcast: self.highest_acceptable_overcast,
            minimum_sunny_temperature: sensor.minimum_temperature_celsius_considered_sunny,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "platform": "Sun Azimuth",
        "lat": 52.52,
        "long": 13.405,
        "apikey": "abc123",
        "enableWeatherIntegration": true,
        "highestAcceptableOvercast": 40,
        "weatherUpdateIntervalSeconds": 600,
        "debugLog": true,
        "sensors": [
            {
                "name": "Terrace",
                "lowerThreshold": 90,
                "upperThreshold": 250,
                "lowerAltitudeThreshold": 5,
                "upperAltitudeThreshold": 90,
                "minimumTemperatureCelsuisConsideredSunny": 8
            },
            {
                "name": "Broken",
                "lowerThreshold": "east",
                "upperThreshold": 180
            }
        ]
    }"#;

    #[test]
    fn test_parse_platform_block() {
        let config: Config = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(config.lat, Some(52.52));
        assert_eq!(config.long, Some(13.405));
        assert_eq!(config.api_key(), Some("abc123"));
        assert!(config.enable_weather_integration);
        assert_eq!(config.highest_acceptable_overcast, Some(40.0));
        assert_eq!(config.weather_update_interval(), Duration::from_secs(600));
        assert!(config.debug_log);
        assert_eq!(config.sensors.len(), 2);
    }

    #[test]
    fn test_misspelled_temperature_field_is_accepted() {
        let config: Config = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(
            config.sensors[0].minimum_temperature_celsius_considered_sunny,
            Some(8.0)
        );
    }

    #[test]
    fn test_non_numeric_threshold_becomes_absent() {
        let config: Config = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(config.sensors[1].lower_threshold, None);
        assert_eq!(config.sensors[1].upper_threshold, Some(180.0));
    }

    #[test]
    fn test_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert!(config.coordinates().is_err());
        assert_eq!(config.api_key(), None);
        assert!(!config.enable_weather_integration);
        assert_eq!(
            config.weather_update_interval(),
            Duration::from_secs(DEFAULT_WEATHER_UPDATE_SECS)
        );
        assert_eq!(
            config.sensor_poll_interval(),
            Duration::from_millis(DEFAULT_SENSOR_POLL_MILLIS)
        );
        assert!(config.sensors.is_empty());
    }

    #[test]
    fn test_non_positive_interval_falls_back_to_default() {
        let config: Config =
            serde_json::from_str(r#"{"weatherUpdateIntervalSeconds": 0}"#).unwrap();
        assert_eq!(
            config.weather_update_interval(),
            Duration::from_secs(DEFAULT_WEATHER_UPDATE_SECS)
        );
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config: Config = serde_json::from_str(r#"{"apikey": "  "}"#).unwrap();
        assert_eq!(config.api_key(), None);
        assert!(!config.weather_settings(&SensorConfig::default()).has_api_key);
    }

    #[test]
    fn test_weather_settings_per_sensor() {
        let config: Config = serde_json::from_str(SAMPLE).unwrap();
        let settings = config.weather_settings(&config.sensors[0]);
        assert!(settings.enabled);
        assert!(settings.has_api_key);
        assert_eq!(settings.highest_acceptable_overcast, Some(40.0));
        assert_eq!(settings.minimum_sunny_temperature, Some(8.0));
    }

    #[test]
    fn test_mqtt_section_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"mqtt": {"brokerHost": "10.0.0.2"}}"#).unwrap();
        let mqtt = config.mqtt.unwrap();
        assert_eq!(mqtt.broker_host, "10.0.0.2");
        assert_eq!(mqtt.broker_port, DEFAULT_MQTT_PORT);
        assert_eq!(mqtt.client_id, DEFAULT_MQTT_CLIENT_ID);
        assert_eq!(mqtt.topic_prefix, DEFAULT_MQTT_TOPIC_PREFIX);
    }

    #[test]
    fn test_parse_dotenv_line() {
        assert_eq!(parse_dotenv_line("SUN_LAT=52.5"), Some(("SUN_LAT", "52.5")));
        assert_eq!(
            parse_dotenv_line("export MQTT_USERNAME = \"sun user\""),
            Some(("MQTT_USERNAME", "sun user"))
        );
        assert_eq!(parse_dotenv_line("NAME='x'"), Some(("NAME", "x")));
        assert_eq!(parse_dotenv_line("# comment"), None);
        assert_eq!(parse_dotenv_line("   "), None);
        assert_eq!(parse_dotenv_line("NO_EQUALS"), None);
        assert_eq!(parse_dotenv_line("=value"), None);
    }

    #[test]
    fn test_altitude_threshold_keeps_non_numeric_values() {
        let config: Config = serde_json::from_str(
            r#"{"sensors": [{"name": "A", "lowerAltitudeThreshold": "high",
                             "upperAltitudeThreshold": 45}]}"#,
        )
        .unwrap();
        let sensor = &config.sensors[0];
        assert_eq!(
            sensor.lower_altitude_threshold,
            NumberField::Invalid(serde_json::json!("high"))
        );
        assert!(sensor.lower_altitude_threshold.value("lower").is_err());
        assert_eq!(sensor.upper_altitude_threshold.value("upper"), Ok(Some(45.0)));
    }

    #[test]
    fn test_absent_and_null_altitude_thresholds() {
        let config: Config = serde_json::from_str(
            r#"{"sensors": [{"name": "A", "upperAltitudeThreshold": null}]}"#,
        )
        .unwrap();
        let sensor = &config.sensors[0];
        assert_eq!(sensor.lower_altitude_threshold, NumberField::Absent);
        assert_eq!(sensor.upper_altitude_threshold, NumberField::Absent);
    }

    #[test]
    fn test_effective_client_id() {
        let mut mqtt = MqttConfig::new("localhost");
        assert_eq!(mqtt.effective_client_id(), DEFAULT_MQTT_CLIENT_ID);
        mqtt.client_id = "   ".to_string();
        assert_eq!(mqtt.effective_client_id(), DEFAULT_MQTT_CLIENT_ID);
        mqtt.client_id = " garden ".to_string();
        assert_eq!(mqtt.effective_client_id(), "garden");
    }

    /// Serializes tests that touch the process environment.
    static ENV_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());

    const OVERRIDES: &[&str] = &[
        "SUN_LAT",
        "SUN_LONG",
        "OPENWEATHER_API_KEY",
        "ENABLE_WEATHER_INTEGRATION",
        "HIGHEST_ACCEPTABLE_OVERCAST",
        "WEATHER_UPDATE_INTERVAL_SECS",
        "DEBUG_LOG",
        "MQTT_BROKER_HOST",
        "MQTT_BROKER_PORT",
        "MQTT_CLIENT_ID",
        "MQTT_USERNAME",
        "MQTT_PASSWORD",
        "MQTT_TOPIC_PREFIX",
    ];

    /// Run `f` with exactly `vars` set among the override variables.
    fn with_env(vars: &[(&str, &str)], f: impl FnOnce()) {
        let _guard = ENV_LOCK.lock();
        // SAFETY: every test touching the environment holds ENV_LOCK
        unsafe {
            for key in OVERRIDES {
                std::env::remove_var(key);
            }
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
        }
        f();
        unsafe {
            for (key, _) in vars {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    fn test_env_overrides_platform_values() {
        with_env(
            &[
                ("SUN_LAT", "48.2"),
                ("SUN_LONG", "16.37"),
                ("OPENWEATHER_API_KEY", "from-env"),
                ("ENABLE_WEATHER_INTEGRATION", "0"),
                ("HIGHEST_ACCEPTABLE_OVERCAST", "25"),
                ("WEATHER_UPDATE_INTERVAL_SECS", "900"),
                ("DEBUG_LOG", "true"),
            ],
            || {
                let mut config: Config = serde_json::from_str(SAMPLE).unwrap();
                config.apply_env();

                assert_eq!(config.lat, Some(48.2));
                assert_eq!(config.long, Some(16.37));
                assert_eq!(config.api_key(), Some("from-env"));
                assert!(!config.enable_weather_integration);
                assert_eq!(config.highest_acceptable_overcast, Some(25.0));
                assert_eq!(config.weather_update_interval(), Duration::from_secs(900));
                assert!(config.debug_log);
                assert!(config.mqtt.is_none());
            },
        );
    }

    #[test]
    fn test_unparsable_env_number_keeps_file_value() {
        with_env(&[("SUN_LAT", "north")], || {
            let mut config: Config = serde_json::from_str(SAMPLE).unwrap();
            config.apply_env();
            assert_eq!(config.lat, Some(52.52));
        });
    }

    #[test]
    fn test_broker_host_env_creates_mqtt_section() {
        with_env(
            &[
                ("MQTT_BROKER_HOST", "broker.local"),
                ("MQTT_BROKER_PORT", "8883"),
                ("MQTT_USERNAME", "sun"),
                ("MQTT_PASSWORD", "secret"),
                ("MQTT_TOPIC_PREFIX", "home/sun"),
            ],
            || {
                let mut config: Config = serde_json::from_str("{}").unwrap();
                config.apply_env();

                let mqtt = config.mqtt.unwrap();
                assert_eq!(mqtt.broker_host, "broker.local");
                assert_eq!(mqtt.broker_port, 8883);
                assert_eq!(mqtt.client_id, DEFAULT_MQTT_CLIENT_ID);
                assert_eq!(mqtt.username.as_deref(), Some("sun"));
                assert_eq!(mqtt.password.as_deref(), Some("secret"));
                assert_eq!(mqtt.topic_prefix, "home/sun");
            },
        );
    }

    #[test]
    fn test_mqtt_env_without_host_or_section_is_ignored() {
        with_env(&[("MQTT_CLIENT_ID", "garden")], || {
            let mut config: Config = serde_json::from_str("{}").unwrap();
            config.apply_env();
            assert!(config.mqtt.is_none());
        });
    }

    #[test]
    fn test_dotenv_never_overrides_existing_variables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(
            &path,
            "# sensor settings\nSUN_LAT=10.5\nSUN_LONG=\"20.25\"\nOPENWEATHER_API_KEY=from-file\n",
        )
        .unwrap();

        with_env(&[("SUN_LAT", "48.2")], || {
            assert_eq!(load_dotenv(&path), 2);
            assert_eq!(std::env::var("SUN_LAT").unwrap(), "48.2");
            assert_eq!(std::env::var("SUN_LONG").unwrap(), "20.25");
            assert_eq!(std::env::var("OPENWEATHER_API_KEY").unwrap(), "from-file");

            // SAFETY: ENV_LOCK is held by with_env
            unsafe {
                std::env::remove_var("SUN_LONG");
                std::env::remove_var("OPENWEATHER_API_KEY");
            }
        });
    }

    #[test]
    fn test_missing_dotenv_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_dotenv(&dir.path().join(".env")), 0);
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = Config::load(Path::new("/nonexistent/sun-azimuth/config.json")).unwrap_err();
        assert!(matches!(err, SensorError::ConfigRead { .. }));
    }
}
