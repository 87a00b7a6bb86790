//! Broker source abstraction.
//!
//! A `BrokerSource` knows how to open one subscription to a broker and hand
//! back a `MessageStream`. The stream is owned exclusively by its consumer
//! loop, is recreated on every reconnect, and must be closed on every exit
//! path.

use crate::error::ConsumerError;
use async_trait::async_trait;
use lapin::options::BasicAckOptions;

/// A single message pulled from a broker.
pub struct InboundMessage {
    key: Option<String>,
    payload: Vec<u8>,
    ack: MessageAck,
}

impl InboundMessage {
    pub fn new(key: Option<String>, payload: Vec<u8>, ack: MessageAck) -> Self {
        Self { key, payload, ack }
    }

    /// The message/routing key, when the broker carries one.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Acknowledge the message to the broker.
    ///
    /// Consumes the message, so the acknowledgment cannot be issued twice.
    pub async fn ack(self) -> Result<(), ConsumerError> {
        match self.ack {
            MessageAck::Auto => Ok(()),
            MessageAck::Amqp(acker) => acker
                .ack(BasicAckOptions::default())
                .await
                .map_err(ConsumerError::ack),
        }
    }
}

/// How a message is acknowledged once handled.
pub enum MessageAck {
    /// The broker commits positions automatically on receipt.
    Auto,
    /// Explicit per-message acknowledgment over an AMQP channel.
    Amqp(lapin::acker::Acker),
}

/// A subscription to one broker.
#[async_trait]
pub trait BrokerSource: Send + Sync {
    type Stream: MessageStream;

    /// Broker name for logging.
    fn name(&self) -> &'static str;

    /// Establish a fresh connection and subscription.
    async fn connect(&self) -> Result<Self::Stream, ConsumerError>;
}

/// An open message stream over one broker connection.
#[async_trait]
pub trait MessageStream: Send {
    /// Pull the next message in receipt order.
    ///
    /// `Ok(None)` means the stream ended cleanly; `Err` means the connection
    /// broke and the consumer's reconnect policy decides what happens next.
    async fn next(&mut self) -> Result<Option<InboundMessage>, ConsumerError>;

    /// Release the underlying connection.
    async fn close(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_auto_ack_is_a_noop() {
        let message = InboundMessage::new(None, b"payload".to_vec(), MessageAck::Auto);
        assert!(message.ack().await.is_ok());
    }

    #[test]
    fn test_message_accessors() {
        let message = InboundMessage::new(
            Some("email_topic".to_string()),
            b"{}".to_vec(),
            MessageAck::Auto,
        );
        assert_eq!(message.key(), Some("email_topic"));
        assert_eq!(message.payload(), b"{}");
    }
}
