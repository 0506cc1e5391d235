//! OpenWeatherMap current-weather client.

use super::{WeatherError, WeatherObservation};
use crate::sun::Coordinates;
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const WEATHER_PATH: &str = "/data/2.5/weather";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Source of weather observations for the cache.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch(&self) -> Result<WeatherObservation, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    clouds: Clouds,
    main: Main,
}

#[derive(Debug, Deserialize)]
struct Clouds {
    all: f64,
}

#[derive(Debug, Deserialize)]
struct Main {
    temp: f64,
}

#[derive(Debug, Clone)]
pub struct OpenWeatherMapClient {
    client: Client,
    base_url: String,
    api_key: String,
    coords: Coordinates,
}

impl OpenWeatherMapClient {
    pub fn new(api_key: &str, coords: Coordinates) -> Result<Self, WeatherError> {
        Self::with_base_url(api_key, coords, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        api_key: &str,
        coords: Coordinates,
        base_url: &str,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            coords,
        })
    }

    fn parse(body: &str) -> Result<WeatherObservation, WeatherError> {
        let response: CurrentWeatherResponse =
            serde_json::from_str(body).map_err(|e| WeatherError::Parse(e.to_string()))?;
        Ok(WeatherObservation {
            overcast: response.clouds.all,
            temperature_celsius: response.main.temp,
            fetched_at: Utc::now(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherMapClient {
    async fn fetch(&self) -> Result<WeatherObservation, WeatherError> {
        let url = format!("{}{}", self.base_url, WEATHER_PATH);
        let lat = self.coords.latitude.to_string();
        let lon = self.coords.longitude.to_string();
        debug!("[Weather] Checking weather: {}?lat={}&lon={}", url, lat, lon);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("appid", self.api_key.as_str()),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(WeatherError::Http {
                status: status.as_u16(),
                body,
            });
        }

        debug!("[Weather] Server response: {}", body);
        Self::parse(&body)
    }
}
