//! Platform: owns the configured sensors and the shared weather cache, and
//! hands the periodic poll and weather refresh to a [`Scheduler`].

use crate::config::Config;
use crate::error::SensorError;
use crate::scheduler::Scheduler;
use crate::sensors::{NotifiableSensor, StateChange, StateNotifier, SunAzimuthSensor};
use crate::sun::Coordinates;
use crate::weather::{OpenWeatherMapClient, RefreshOutcome, WeatherCache, WeatherProvider};
use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

pub struct SunAzimuthPlatform {
    coordinates: Option<Coordinates>,
    sensors: Vec<Arc<SunAzimuthSensor>>,
    cache: Arc<WeatherCache>,
    provider: Option<Arc<dyn WeatherProvider>>,
    poll_interval: Duration,
    weather_interval: Duration,
}

/// Build the OpenWeatherMap client when an API key and valid coordinates
/// are configured.
pub fn weather_provider(config: &Config) -> Option<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key()?;
    let coords = match config.coordinates() {
        Ok(coords) => coords,
        Err(e) => {
            warn!("[Weather] Not fetching weather: {}", e);
            return None;
        }
    };

    let client = match config.weather_api_base_url.as_deref() {
        Some(base_url) => OpenWeatherMapClient::with_base_url(api_key, coords, base_url),
        None => OpenWeatherMapClient::new(api_key, coords),
    };
    match client {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            error!("[Weather] Failed to create weather client: {}", e);
            None
        }
    }
}

impl SunAzimuthPlatform {
    /// Build the platform. Sensors that fail validation are logged and
    /// skipped; the rest are registered.
    pub fn new(config: &Config, provider: Option<Arc<dyn WeatherProvider>>) -> Self {
        let coordinates = match config.coordinates() {
            Ok(coords) => Some(coords),
            Err(e) => {
                error!("[Platform] Error: {}. All sensors will report closed.", e);
                None
            }
        };

        let mut names = HashSet::new();
        let mut sensors = Vec::with_capacity(config.sensors.len());
        for sensor_config in &config.sensors {
            let registered =
                SunAzimuthSensor::from_config(sensor_config, config.weather_settings(sensor_config))
                    .and_then(|sensor| {
                        if names.insert(sensor.name().to_string()) {
                            Ok(sensor)
                        } else {
                            Err(SensorError::DuplicateSensor(sensor.name().to_string()))
                        }
                    });

            match registered {
                Ok(sensor) => {
                    info!("[Platform] Registering sensor: {} ({})", sensor.name(), sensor.model());
                    sensors.push(Arc::new(sensor));
                }
                Err(e) => error!("[Platform] Error: {}. Skipping this sensor.", e),
            }
        }

        Self {
            coordinates,
            sensors,
            cache: Arc::new(WeatherCache::new()),
            provider,
            poll_interval: config.sensor_poll_interval(),
            weather_interval: config.weather_update_interval(),
        }
    }

    /// Build the platform together with its weather client.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config, weather_provider(config))
    }

    pub fn sensors(&self) -> &[Arc<SunAzimuthSensor>] {
        &self.sensors
    }

    pub fn weather_cache(&self) -> &Arc<WeatherCache> {
        &self.cache
    }

    pub fn has_weather(&self) -> bool {
        self.provider.is_some()
    }

    /// Route every sensor's state changes into `tx`.
    pub fn attach_notifier(&self, tx: &UnboundedSender<StateChange>) {
        for sensor in &self.sensors {
            sensor
                .state()
                .set_notifier(StateNotifier::new(sensor.name(), tx.clone()));
        }
    }

    /// Re-derive every sensor's state for `now` from the cached weather.
    pub fn poll(&self, now: DateTime<Utc>) {
        let observation = self.cache.latest();
        if let Some(age) = self.cache.age(now) {
            debug!("[Weather] Cached observation is {}s old", age.num_seconds());
        }
        for sensor in &self.sensors {
            sensor.update(now, self.coordinates.as_ref(), observation.as_ref());
        }
    }

    /// Fetch fresh weather into the cache. `None` without a weather client.
    pub async fn refresh_weather(&self) -> Option<RefreshOutcome> {
        let provider = self.provider.as_deref()?;
        Some(self.cache.refresh(provider).await)
    }

    /// Schedule the sensor poll and, if configured, the weather refresh.
    ///
    /// With a weather client the first observation is fetched before the
    /// first poll, so sensors never start from a weather-less evaluation.
    pub async fn start(self: &Arc<Self>, scheduler: &dyn Scheduler) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(2);

        if self.provider.is_some() {
            self.refresh_weather().await;
            info!(
                "[Platform] Updating weather every {}s",
                self.weather_interval.as_secs()
            );
            let platform = Arc::clone(self);
            handles.push(scheduler.schedule_after(
                "weather-refresh",
                self.weather_interval,
                self.weather_interval,
                Box::new(move || {
                    let platform = Arc::clone(&platform);
                    async move {
                        platform.refresh_weather().await;
                    }
                    .boxed()
                }),
            ));
        }

        info!(
            "[Platform] Polling {} sensor(s) every {}ms",
            self.sensors.len(),
            self.poll_interval.as_millis()
        );
        let platform = Arc::clone(self);
        handles.push(scheduler.schedule(
            "sensor-poll",
            self.poll_interval,
            Box::new(move || {
                let platform = Arc::clone(&platform);
                async move { platform.poll(Utc::now()) }.boxed()
            }),
        ));

        handles
    }
}
