//! Mock mail transport for testing.

use super::MailTransport;
use crate::error::DeliveryError;
use crate::models::EmailMessage;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Mock transport that captures delivered messages.
pub struct MockMailer {
    delivered: Arc<Mutex<Vec<EmailMessage>>>,
    should_fail: bool,
    failure_message: Option<String>,
}

impl MockMailer {
    /// Create a mock that accepts every delivery.
    pub fn new() -> Self {
        Self {
            delivered: Arc::new(Mutex::new(Vec::new())),
            should_fail: false,
            failure_message: None,
        }
    }

    /// Create a mock that fails every delivery and health check.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            delivered: Arc::new(Mutex::new(Vec::new())),
            should_fail: true,
            failure_message: Some(message.into()),
        }
    }

    /// Get all delivered messages.
    pub async fn delivered(&self) -> Vec<EmailMessage> {
        self.delivered.lock().await.clone()
    }

    /// Get the count of delivered messages.
    pub async fn delivered_count(&self) -> usize {
        self.delivered.lock().await.len()
    }

    /// Check whether any delivered message included the given recipient.
    pub async fn was_delivered_to(&self, address: &str) -> bool {
        self.delivered
            .lock()
            .await
            .iter()
            .any(|message| message.recipients.iter().any(|r| r == address))
    }
}

impl Default for MockMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MailTransport for MockMailer {
    async fn deliver(&self, message: &EmailMessage) -> Result<(), DeliveryError> {
        if self.should_fail {
            let details = self
                .failure_message
                .clone()
                .unwrap_or_else(|| "Mock failure".to_string());
            return Err(DeliveryError::Transport(details));
        }

        self.delivered.lock().await.push(message.clone());
        Ok(())
    }

    async fn check_health(&self) -> Result<(), DeliveryError> {
        if self.should_fail {
            let details = self
                .failure_message
                .clone()
                .unwrap_or_else(|| "Mock failure".to_string());
            return Err(DeliveryError::Transport(details));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
