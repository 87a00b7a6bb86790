//! Generic queue consumer framework.
//!
//! This crate provides:
//! - `QueueConsumer`, the single consumer loop shared by every broker
//! - `ReconnectPolicy` for per-source connection behavior
//! - `BrokerSource` / `MessageStream` traits implemented by the Kafka and
//!   AMQP sources
//! - `Processor`, the trait a domain handler implements to receive payloads
//!
//! The loop owns its broker connection exclusively, recreates it on every
//! reconnect, and releases it on every exit path. Per-message failures are
//! contained: they are logged, acknowledged, and never terminate the loop.

pub mod amqp;
pub mod consumer;
pub mod error;
pub mod kafka;
pub mod policy;
pub mod processor;
pub mod source;

pub use amqp::{AmqpConfig, AmqpSource};
pub use consumer::{ConsumerConfig, QueueConsumer};
pub use error::ConsumerError;
pub use kafka::{KafkaConfig, KafkaSource};
pub use policy::{Backoff, ReconnectPolicy};
pub use processor::{ProcessError, Processor};
pub use source::{BrokerSource, InboundMessage, MessageAck, MessageStream};
