//! Change notifier for pushing sensor state to sinks.
//!
//! When a sensor flips, the change is sent over an unbounded channel so the
//! poll task never waits on a slow consumer (e.g. an MQTT broker).

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// A sensor changed its open/closed state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateChange {
    pub sensor: String,
    pub open: bool,
    pub changed_at: DateTime<Utc>,
}

/// Notifies sinks when a sensor value changes.
pub struct StateNotifier {
    sensor: String,
    tx: UnboundedSender<StateChange>,
}

impl StateNotifier {
    pub fn new(sensor: impl Into<String>, tx: UnboundedSender<StateChange>) -> Self {
        Self {
            sensor: sensor.into(),
            tx,
        }
    }

    /// Send the new state. Non-blocking; a closed channel is ignored.
    pub fn notify(&self, open: bool) {
        let change = StateChange {
            sensor: self.sensor.clone(),
            open,
            changed_at: Utc::now(),
        };
        if self.tx.send(change).is_err() {
            log::debug!("[Sensor] {}: no sink listening for state changes", self.sensor);
        }
    }
}
