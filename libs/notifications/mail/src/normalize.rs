//! Payload validation and normalization.

use crate::error::ValidationError;
use crate::models::{EmailMessage, EmailPayload, Origin};

/// Subject applied to request-origin payloads that omit one.
pub const DEFAULT_SUBJECT: &str = "(no subject)";

/// Turns raw payloads into delivery-ready messages.
///
/// This is the only address-shape check in the service; the HTTP path and
/// both queue processors all route through it, so the rules cannot drift.
#[derive(Debug, Clone)]
pub struct Normalizer {
    default_subject: String,
}

impl Normalizer {
    pub fn new(default_subject: impl Into<String>) -> Self {
        Self {
            default_subject: default_subject.into(),
        }
    }

    /// Validate a payload and produce an [`EmailMessage`].
    ///
    /// Queue origins require all three fields present and non-empty. The
    /// request origin may omit the subject, which then defaults to the
    /// configured placeholder. Recipient validation is all-or-nothing.
    pub fn normalize(
        &self,
        payload: EmailPayload,
        origin: Origin,
    ) -> Result<EmailMessage, ValidationError> {
        let recipients = payload
            .receiver_email
            .ok_or(ValidationError::MissingField("receiver_email"))?
            .into_vec();

        if recipients.is_empty() {
            return Err(ValidationError::NoRecipients);
        }
        for address in &recipients {
            if !has_address_shape(address) {
                return Err(ValidationError::InvalidRecipient(address.clone()));
            }
        }

        let subject = match payload.email_object {
            Some(subject) if !subject.is_empty() => subject,
            _ if origin.is_queue() => {
                return Err(ValidationError::MissingField("email_object"));
            }
            _ => self.default_subject.clone(),
        };

        let body_html = match payload.message_text {
            Some(body) if !body.is_empty() => body,
            _ => return Err(ValidationError::MissingField("message_text")),
        };

        Ok(EmailMessage {
            recipients,
            subject,
            body_html,
        })
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_SUBJECT)
    }
}

/// Minimal address shape: a non-empty local part and domain separated by
/// "@". Anything deeper is left to the transport.
fn has_address_shape(address: &str) -> bool {
    matches!(
        address.split_once('@'),
        Some((local, domain)) if !local.is_empty() && !domain.is_empty()
    )
}
