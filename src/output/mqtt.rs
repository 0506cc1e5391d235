//! MQTT publisher for sensor state.

use super::StateSink;
use crate::config::MqttConfig;
use crate::error::Result;
use crate::sensors::StateChange;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::time::Duration;

/// MQTT client connection.
pub struct MqttClient {
    client: AsyncClient,
    event_loop: EventLoop,
}

impl MqttClient {
    /// Create a new MQTT client from configuration.
    pub fn new(config: &MqttConfig) -> Self {
        let client_id = config.effective_client_id();
        if client_id != config.client_id {
            warn!("[MQTT] Invalid client id {:?}, using {:?}", config.client_id, client_id);
        }
        let mut options = MqttOptions::new(client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(Duration::from_secs(30));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(options, 100);

        Self { client, event_loop }
    }

    /// Get a clone of the async client for publishing from other tasks.
    pub fn client(&self) -> AsyncClient {
        self.client.clone()
    }

    /// Drive the connection. Publishes only go out while this runs.
    ///
    /// Runs until the task is aborted; connection errors are logged and
    /// retried after a pause.
    pub async fn run(mut self) {
        info!("[MQTT] Starting event loop");

        loop {
            match self.event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("[MQTT] Connected to broker");
                }
                Ok(_) => {}
                Err(e) => {
                    error!("[MQTT] Connection error: {:?}", e);
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }
}

/// Lowercase, dash-separated topic segment for a sensor name.
pub fn topic_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Publishes each change as a retained JSON message.
pub struct MqttSink {
    client: AsyncClient,
    topic_prefix: String,
}

impl MqttSink {
    pub fn new(client: AsyncClient, topic_prefix: impl Into<String>) -> Self {
        Self {
            client,
            topic_prefix: topic_prefix.into(),
        }
    }

    pub fn topic(&self, sensor: &str) -> String {
        format!(
            "{}/{}/contact",
            self.topic_prefix.trim_end_matches('/'),
            topic_slug(sensor)
        )
    }

    pub fn payload(change: &StateChange) -> Result<String> {
        Ok(serde_json::to_string(&serde_json::json!({
            "open": change.open,
            "changed_at": change.changed_at.to_rfc3339(),
        }))?)
    }
}

#[async_trait]
impl StateSink for MqttSink {
    async fn publish(&self, change: &StateChange) -> Result<()> {
        let topic = self.topic(&change.sensor);
        let payload = Self::payload(change)?;
        debug!("[MQTT] Publishing to {}: {}", topic, payload);
        self.client
            .publish(topic, QoS::AtLeastOnce, true, payload.into_bytes())
            .await?;
        Ok(())
    }
}
