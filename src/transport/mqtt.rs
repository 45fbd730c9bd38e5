// MIT License - Copyright (c) 2026 Peter Wright
// MQTT publisher for encoded envelopes

use rumqttc::{AsyncClient, QoS};

use super::Publisher;
use crate::error::{GatewayError, Result};

/// Publishes envelopes through a rumqttc client without awaiting.
///
/// `try_publish` queues the request for the event loop task. A full queue
/// or closed client is reported as a publish failure and the event is
/// dropped.
#[derive(Debug, Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    pub fn new(client: AsyncClient) -> Self {
        Self { client }
    }
}

impl Publisher for MqttPublisher {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<()> {
        self.client
            .try_publish(topic, QoS::AtLeastOnce, false, payload.as_bytes().to_vec())
            .map_err(|e| GatewayError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })
    }
}
