//! Kafka broker source.
//!
//! Consumes from a single topic with a consumer group. Offsets are committed
//! automatically as messages are received, which gives at-least-once
//! hand-off: a crash between receipt and delivery can duplicate or drop
//! depending on commit timing.

use crate::error::ConsumerError;
use crate::source::{BrokerSource, InboundMessage, MessageAck, MessageStream};
use async_trait::async_trait;
use core_config::{env_flag, env_or_default, env_required, ConfigError, FromEnv};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use std::time::Duration;

/// Kafka consumer configuration.
#[derive(Debug, Clone)]
pub struct KafkaConfig {
    /// Feature toggle; when false the consumer is a no-op.
    pub enabled: bool,
    pub bootstrap_servers: String,
    pub topic: String,
    pub group_id: String,
    /// Messages carrying this key are email requests; others are ignored.
    pub message_key: String,
}

impl FromEnv for KafkaConfig {
    /// Reads from environment variables:
    /// - `USE_KAFKA`: feature toggle, defaults to false
    /// - `KAFKA_BOOTSTRAP_SERVERS`, `KAFKA_CONSUMER_TOPIC`: required when
    ///   the toggle is on
    /// - `KAFKA_GROUP_ID`: defaults to "courier-mail"
    /// - `KAFKA_MESSAGE_KEY`: defaults to "email_topic"
    fn from_env() -> Result<Self, ConfigError> {
        let enabled = env_flag("USE_KAFKA", false);
        let (bootstrap_servers, topic) = if enabled {
            (
                env_required("KAFKA_BOOTSTRAP_SERVERS")?,
                env_required("KAFKA_CONSUMER_TOPIC")?,
            )
        } else {
            (String::new(), String::new())
        };

        Ok(Self {
            enabled,
            bootstrap_servers,
            topic,
            group_id: env_or_default("KAFKA_GROUP_ID", "courier-mail"),
            message_key: env_or_default("KAFKA_MESSAGE_KEY", "email_topic"),
        })
    }
}

/// Kafka source: one `StreamConsumer` subscription per connection.
pub struct KafkaSource {
    config: KafkaConfig,
}

impl KafkaSource {
    pub fn new(config: KafkaConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BrokerSource for KafkaSource {
    type Stream = KafkaStream;

    fn name(&self) -> &'static str {
        "kafka"
    }

    async fn connect(&self) -> Result<KafkaStream, ConsumerError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("group.id", &self.config.group_id)
            .set("bootstrap.servers", &self.config.bootstrap_servers)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "true")
            .create()
            .map_err(|e| ConsumerError::connect("kafka", e))?;

        // librdkafka connects lazily; probe the broker so an unreachable
        // cluster surfaces here instead of hanging in recv().
        let topic = self.config.topic.clone();
        let consumer = match tokio::task::spawn_blocking(move || {
            consumer
                .fetch_metadata(Some(&topic), Duration::from_secs(5))
                .map(|_| consumer)
                .map_err(|e| ConsumerError::connect("kafka", e))
        })
        .await
        {
            Ok(result) => result?,
            Err(e) => {
                return Err(ConsumerError::broker(format!(
                    "metadata probe task failed: {e}"
                )));
            }
        };

        consumer
            .subscribe(&[&self.config.topic])
            .map_err(|e| ConsumerError::connect("kafka", e))?;

        Ok(KafkaStream { consumer })
    }
}

/// An open Kafka subscription.
pub struct KafkaStream {
    consumer: StreamConsumer,
}

#[async_trait]
impl MessageStream for KafkaStream {
    async fn next(&mut self) -> Result<Option<InboundMessage>, ConsumerError> {
        match self.consumer.recv().await {
            Ok(message) => {
                let key = message
                    .key()
                    .map(|k| String::from_utf8_lossy(k).into_owned());
                let payload = message.payload().unwrap_or_default().to_vec();
                Ok(Some(InboundMessage::new(key, payload, MessageAck::Auto)))
            }
            Err(e) => Err(ConsumerError::broker(e)),
        }
    }

    async fn close(&mut self) {
        self.consumer.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_when_disabled() {
        temp_env::with_vars(
            [
                ("USE_KAFKA", None::<&str>),
                ("KAFKA_GROUP_ID", None),
                ("KAFKA_MESSAGE_KEY", None),
            ],
            || {
                let config = KafkaConfig::from_env().unwrap();
                assert!(!config.enabled);
                assert_eq!(config.group_id, "courier-mail");
                assert_eq!(config.message_key, "email_topic");
            },
        );
    }

    #[test]
    fn test_config_requires_servers_when_enabled() {
        temp_env::with_vars(
            [
                ("USE_KAFKA", Some("true")),
                ("KAFKA_BOOTSTRAP_SERVERS", None),
                ("KAFKA_CONSUMER_TOPIC", None),
            ],
            || {
                let err = KafkaConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("KAFKA_BOOTSTRAP_SERVERS"));
            },
        );
    }

    #[test]
    fn test_config_enabled() {
        temp_env::with_vars(
            [
                ("USE_KAFKA", Some("true")),
                ("KAFKA_BOOTSTRAP_SERVERS", Some("broker-1:9092,broker-2:9092")),
                ("KAFKA_CONSUMER_TOPIC", Some("emails")),
            ],
            || {
                let config = KafkaConfig::from_env().unwrap();
                assert!(config.enabled);
                assert_eq!(config.bootstrap_servers, "broker-1:9092,broker-2:9092");
                assert_eq!(config.topic, "emails");
            },
        );
    }
}
