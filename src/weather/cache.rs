//! Single-slot weather cache with an in-flight fetch guard.

use super::{WeatherObservation, WeatherProvider};
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Result of a single [`WeatherCache::refresh`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new observation replaced the cached one.
    Updated,
    /// The fetch failed; the previous observation was kept.
    Failed,
    /// Another fetch was still running, nothing was requested.
    Skipped,
}

/// Latest weather observation, shared between the refresh task and the
/// sensor polls. Readers never wait for the network.
#[derive(Debug, Default)]
pub struct WeatherCache {
    latest: RwLock<Option<WeatherObservation>>,
    fetching: AtomicBool,
}

/// Clears the in-flight flag when the fetch completes or is dropped.
struct FetchGuard<'a>(&'a AtomicBool);

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl WeatherCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the last successful observation, if any.
    pub fn latest(&self) -> Option<WeatherObservation> {
        *self.latest.read()
    }

    /// How old the cached observation is at `now`.
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.latest.read().map(|w| now - w.fetched_at)
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching.load(Ordering::SeqCst)
    }

    /// Fetch a new observation and replace the cached one on success.
    pub async fn refresh(&self, provider: &dyn WeatherProvider) -> RefreshOutcome {
        if self
            .fetching
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return RefreshOutcome::Skipped;
        }
        let _guard = FetchGuard(&self.fetching);

        match provider.fetch().await {
            Ok(observation) => {
                info!(
                    "[Weather] Temperature: {}°C, overcast (cloud state): {}%",
                    observation.temperature_celsius, observation.overcast
                );
                *self.latest.write() = Some(observation);
                RefreshOutcome::Updated
            }
            Err(e) => {
                warn!("[Weather] Getting weather failed: {}", e);
                RefreshOutcome::Failed
            }
        }
    }
}
