//! Consumer error types.

use thiserror::Error;

/// Errors raised by broker sources and the consumer loop.
#[derive(Error, Debug)]
pub enum ConsumerError {
    /// A connection to the broker could not be established.
    #[error("Failed to connect to {broker}: {details}")]
    Connect {
        broker: &'static str,
        details: String,
    },

    /// The broker failed after a connection was established.
    #[error("Broker error: {0}")]
    Broker(String),

    /// A message could not be acknowledged.
    #[error("Acknowledgment failed: {0}")]
    Ack(String),
}

impl ConsumerError {
    /// Create a connection-establishment error.
    pub fn connect(broker: &'static str, details: impl std::fmt::Display) -> Self {
        Self::Connect {
            broker,
            details: details.to_string(),
        }
    }

    /// Create an established-connection error.
    pub fn broker(details: impl std::fmt::Display) -> Self {
        Self::Broker(details.to_string())
    }

    /// Create an acknowledgment error.
    pub fn ack(details: impl std::fmt::Display) -> Self {
        Self::Ack(details.to_string())
    }

    /// Whether this error occurred while establishing a connection.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_error_names_broker() {
        let err = ConsumerError::connect("kafka", "broker unreachable");
        assert!(err.is_connect());
        assert!(err.to_string().contains("kafka"));
        assert!(err.to_string().contains("broker unreachable"));
    }

    #[test]
    fn test_broker_error_is_not_connect() {
        assert!(!ConsumerError::broker("stream closed").is_connect());
    }
}
