//! Error types for mail validation and delivery.

use thiserror::Error;

/// Rejection reasons for inbound payloads.
///
/// Validation is all-or-nothing: one bad recipient rejects the whole
/// message, never a partial send.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing or empty required field '{0}'")]
    MissingField(&'static str),

    #[error("No recipients provided")]
    NoRecipients,

    #[error("Invalid recipient address '{0}'")]
    InvalidRecipient(String),
}

/// Delivery failures, classified so each caller can apply its own
/// containment policy.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The mail transport is not fully configured.
    #[error("Mail transport configuration incomplete: '{0}' is not set")]
    Config(&'static str),

    /// The outbound message could not be assembled.
    #[error("Failed to build message: {0}")]
    Message(String),

    /// Connection, TLS, authentication, or recipient rejection during send.
    #[error("SMTP transport error: {0}")]
    Transport(String),
}

impl DeliveryError {
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<lettre::transport::smtp::Error> for DeliveryError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<lettre::error::Error> for DeliveryError {
    fn from(err: lettre::error::Error) -> Self {
        Self::Message(err.to_string())
    }
}

impl From<lettre::address::AddressError> for DeliveryError {
    fn from(err: lettre::address::AddressError) -> Self {
        Self::Message(err.to_string())
    }
}
