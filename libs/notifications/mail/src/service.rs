//! The synchronous dispatch path.

use crate::error::{DeliveryError, ValidationError};
use crate::models::{EmailMessage, EmailPayload, Origin};
use crate::normalize::Normalizer;
use crate::transport::MailTransport;
use std::sync::Arc;
use thiserror::Error;

/// Error surfaced to synchronous callers. No retries happen here; every
/// failure is the caller's to handle.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Normalizes a request payload and delivers it in one call.
///
/// Shares the normalizer and the transport with the queue processors, so the
/// validation rules and the delivery path are identical across origins.
#[derive(Clone)]
pub struct MailService {
    normalizer: Normalizer,
    transport: Arc<dyn MailTransport>,
}

impl MailService {
    pub fn new(normalizer: Normalizer, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            normalizer,
            transport,
        }
    }

    /// Normalize and deliver a request-origin payload.
    pub async fn send(&self, payload: EmailPayload) -> Result<EmailMessage, DispatchError> {
        let message = self.normalizer.normalize(payload, Origin::Request)?;
        self.transport.deliver(&message).await?;
        Ok(message)
    }

    /// Probe the mail transport without sending.
    pub async fn check_health(&self) -> Result<(), DeliveryError> {
        self.transport.check_health().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Recipients;
    use crate::normalize::DEFAULT_SUBJECT;
    use crate::transport::MockMailer;

    fn service(mock: Arc<MockMailer>) -> MailService {
        MailService::new(Normalizer::default(), mock)
    }

    #[tokio::test]
    async fn test_send_delivers_to_every_recipient() {
        let mock = Arc::new(MockMailer::new());
        let service = service(mock.clone());

        let message = service
            .send(EmailPayload {
                receiver_email: Some(Recipients::Many(vec![
                    "a@x.com".to_string(),
                    "b@y.com".to_string(),
                ])),
                email_object: None,
                message_text: Some("Hi".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(message.subject, DEFAULT_SUBJECT);
        assert!(mock.was_delivered_to("a@x.com").await);
        assert!(mock.was_delivered_to("b@y.com").await);
    }

    #[tokio::test]
    async fn test_validation_error_prevents_delivery() {
        let mock = Arc::new(MockMailer::new());
        let service = service(mock.clone());

        let err = service
            .send(EmailPayload {
                receiver_email: Some(Recipients::One("not-an-address".to_string())),
                email_object: Some("Subject".to_string()),
                message_text: Some("Hi".to_string()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Validation(_)));
        assert_eq!(mock.delivered_count().await, 0);
    }

    #[tokio::test]
    async fn test_transport_error_is_surfaced() {
        let mock = Arc::new(MockMailer::failing("SMTP down"));
        let service = service(mock);

        let err = service
            .send(EmailPayload {
                receiver_email: Some(Recipients::One("a@x.com".to_string())),
                email_object: Some("Subject".to_string()),
                message_text: Some("Hi".to_string()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Delivery(_)));
    }
}
