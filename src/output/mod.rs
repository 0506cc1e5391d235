//! Consumers of sensor state changes.
//!
//! The sensors never know who is listening: state changes go through a
//! channel into whichever [`StateSink`] the binary wires up.

pub mod mqtt;

pub use mqtt::{MqttClient, MqttSink};

use crate::error::Result;
use crate::sensors::StateChange;
use async_trait::async_trait;
use log::{info, warn};
use tokio::sync::mpsc::UnboundedReceiver;

#[async_trait]
pub trait StateSink: Send + Sync {
    async fn publish(&self, change: &StateChange) -> Result<()>;
}

/// Logs every change. Used when no broker is configured.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl StateSink for LogSink {
    async fn publish(&self, change: &StateChange) -> Result<()> {
        info!(
            "[Output] {} is now {}",
            change.sensor,
            if change.open { "open" } else { "closed" }
        );
        Ok(())
    }
}

/// Forward changes to `sink` until every sender is dropped.
pub async fn forward_changes(mut rx: UnboundedReceiver<StateChange>, sink: &dyn StateSink) {
    while let Some(change) = rx.recv().await {
        if let Err(e) = sink.publish(&change).await {
            warn!("[Output] Failed to publish state of {}: {}", change.sensor, e);
        }
    }
}
