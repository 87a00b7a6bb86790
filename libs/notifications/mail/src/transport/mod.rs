//! Mail transport implementations.

pub mod mock;
pub mod smtp;

pub use mock::MockMailer;
pub use smtp::{SmtpMailer, SmtpSettings};

use crate::error::DeliveryError;
use crate::models::EmailMessage;
use async_trait::async_trait;

/// Capability for delivering one message and probing transport health.
///
/// Implementations are stateless per call and safe to invoke concurrently
/// from the HTTP path and both consumer loops.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver a single message.
    ///
    /// One transport session per call; no batching, no pooling, no retries.
    /// Retry policy belongs to callers.
    async fn deliver(&self, message: &EmailMessage) -> Result<(), DeliveryError>;

    /// Check whether the transport is reachable without sending mail.
    async fn check_health(&self) -> Result<(), DeliveryError>;

    /// Transport name for logging.
    fn name(&self) -> &'static str;
}
