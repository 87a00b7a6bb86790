//! Queue-side processor bridging a consumer loop to the delivery sink.

use crate::models::{EmailPayload, Origin};
use crate::normalize::Normalizer;
use crate::transport::MailTransport;
use async_trait::async_trait;
use queue_worker::{ProcessError, Processor};
use std::sync::Arc;
use tracing::debug;

/// Decodes, normalizes, and delivers one queue message at a time.
///
/// Failures are classified for the consumer loop, which logs, acknowledges,
/// and moves on; nothing here ever stops a loop.
pub struct MailProcessor {
    normalizer: Normalizer,
    transport: Arc<dyn MailTransport>,
    origin: Origin,
}

impl MailProcessor {
    pub fn new(normalizer: Normalizer, transport: Arc<dyn MailTransport>, origin: Origin) -> Self {
        Self {
            normalizer,
            transport,
            origin,
        }
    }
}

#[async_trait]
impl Processor for MailProcessor {
    async fn process(&self, payload: &[u8]) -> Result<(), ProcessError> {
        let payload: EmailPayload =
            serde_json::from_slice(payload).map_err(ProcessError::malformed)?;

        let message = self
            .normalizer
            .normalize(payload, self.origin)
            .map_err(ProcessError::malformed)?;

        debug!(
            origin = %self.origin,
            recipients = ?message.recipients,
            subject = %message.subject,
            "Dispatching email"
        );

        self.transport
            .deliver(&message)
            .await
            .map_err(ProcessError::delivery)?;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "mail"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockMailer;

    fn processor(mock: Arc<MockMailer>, origin: Origin) -> MailProcessor {
        MailProcessor::new(Normalizer::default(), mock, origin)
    }

    #[tokio::test]
    async fn test_valid_payload_is_delivered() {
        let mock = Arc::new(MockMailer::new());
        let processor = processor(mock.clone(), Origin::Kafka);

        processor
            .process(
                br#"{"receiver_email": ["a@x.com", "b@y.com"], "email_object": "Hello", "message_text": "<p>Hi</p>"}"#,
            )
            .await
            .unwrap();

        let delivered = mock.delivered().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].recipients, vec!["a@x.com", "b@y.com"]);
        assert_eq!(delivered[0].subject, "Hello");
    }

    #[tokio::test]
    async fn test_invalid_json_is_malformed() {
        let mock = Arc::new(MockMailer::new());
        let processor = processor(mock.clone(), Origin::Amqp);

        let err = processor.process(b"not json at all").await.unwrap_err();

        assert!(err.is_malformed());
        assert_eq!(mock.delivered_count().await, 0);
    }

    #[tokio::test]
    async fn test_incomplete_payload_is_malformed_and_not_delivered() {
        let mock = Arc::new(MockMailer::new());
        let processor = processor(mock.clone(), Origin::Kafka);

        let err = processor
            .process(br#"{"receiver_email": "a@x.com"}"#)
            .await
            .unwrap_err();

        assert!(err.is_malformed());
        assert_eq!(mock.delivered_count().await, 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_a_delivery_error() {
        let mock = Arc::new(MockMailer::failing("connection refused"));
        let processor = processor(mock, Origin::Amqp);

        let err = processor
            .process(
                br#"{"receiver_email": "a@x.com", "email_object": "Hello", "message_text": "Hi"}"#,
            )
            .await
            .unwrap_err();

        assert!(!err.is_malformed());
    }
}
