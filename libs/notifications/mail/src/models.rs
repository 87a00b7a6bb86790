//! Wire payloads and the validated message model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an inbound payload came from.
///
/// Queue origins have stricter validation rules than the synchronous
/// request path (no defaulted subject).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Request,
    Kafka,
    Amqp,
}

impl Origin {
    pub fn is_queue(&self) -> bool {
        !matches!(self, Origin::Request)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Request => write!(f, "request"),
            Origin::Kafka => write!(f, "kafka"),
            Origin::Amqp => write!(f, "amqp"),
        }
    }
}

/// One or many recipient addresses on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recipients {
    One(String),
    Many(Vec<String>),
}

impl Recipients {
    /// Normalize to the list form, preserving order.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Recipients::One(address) => vec![address],
            Recipients::Many(addresses) => addresses,
        }
    }
}

/// Raw email request payload, shared by the HTTP endpoint and both queues.
///
/// Every field is optional at the decoding layer; presence rules depend on
/// the payload's [`Origin`] and are enforced by the normalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailPayload {
    #[serde(default)]
    pub receiver_email: Option<Recipients>,
    #[serde(default)]
    pub email_object: Option<String>,
    #[serde(default)]
    pub message_text: Option<String>,
}

/// A validated, delivery-ready email message.
///
/// Created per inbound item and discarded after the delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Ordered recipient list; non-empty, every entry passed the
    /// address-shape check.
    pub recipients: Vec<String>,
    pub subject: String,
    /// Rich body, sent as UTF-8 HTML; never empty.
    pub body_html: String,
}
