//! Processor trait and per-message error classification.

use async_trait::async_trait;
use thiserror::Error;

/// Why a single message failed.
///
/// The consumer loop uses the classification only for logging; either way the
/// message is acknowledged and the loop continues.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The payload could not be decoded or validated.
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// The message was valid but delivery failed.
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

impl ProcessError {
    pub fn malformed(details: impl std::fmt::Display) -> Self {
        Self::Malformed(details.to_string())
    }

    pub fn delivery(details: impl std::fmt::Display) -> Self {
        Self::Delivery(details.to_string())
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

/// Trait for message handlers.
///
/// Implementations receive the raw payload of each accepted message. They
/// must never panic on bad input; every failure is reported through
/// [`ProcessError`] so the loop can contain it.
#[async_trait]
pub trait Processor: Send + Sync {
    /// Handle a single message payload.
    async fn process(&self, payload: &[u8]) -> Result<(), ProcessError>;

    /// Get the processor name for logging.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ProcessError::malformed("missing field").is_malformed());
        assert!(!ProcessError::delivery("smtp down").is_malformed());
    }
}
