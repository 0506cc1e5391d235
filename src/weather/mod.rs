//! Weather integration.
//!
//! A single cached observation, refreshed on its own timer, can narrow a
//! "sun visible" result down to closed when it is too cloudy or too cold.

pub mod cache;
pub mod client;
pub mod gate;

pub use cache::{RefreshOutcome, WeatherCache};
pub use client::{OpenWeatherMapClient, WeatherProvider};
pub use gate::{WeatherSettings, gate};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Latest known weather at the configured location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherObservation {
    /// Cloud cover in percent.
    pub overcast: f64,
    pub temperature_celsius: f64,
    pub fetched_at: DateTime<Utc>,
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Parse error: {0}")]
    Parse(String),
}
