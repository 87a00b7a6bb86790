//! Mail dispatch library.
//!
//! Everything between an inbound email request and the outbound SMTP session:
//!
//! - **Models**: `EmailPayload` (the wire shape shared by the HTTP endpoint
//!   and both queues) and `EmailMessage` (the validated, delivery-ready form)
//! - **Normalizer**: turns raw payloads into `EmailMessage` or rejects them,
//!   with origin-specific rules
//! - **Transports**: the `MailTransport` capability with an SMTP
//!   implementation (lettre) and a capturing mock for tests
//! - **Service**: the synchronous dispatch path used by the HTTP API
//! - **Processor**: the queue-side bridge implementing
//!   `queue_worker::Processor`
//!
//! ## Usage
//!
//! ```ignore
//! use mail::{MailService, Normalizer, SmtpMailer, SmtpSettings};
//!
//! let transport = Arc::new(SmtpMailer::new(SmtpSettings::from_env()?));
//! let service = MailService::new(Normalizer::default(), transport);
//! service.send(payload).await?;
//! ```

pub mod error;
pub mod models;
pub mod normalize;
pub mod processor;
pub mod service;
pub mod transport;

pub use error::{DeliveryError, ValidationError};
pub use models::{EmailMessage, EmailPayload, Origin, Recipients};
pub use normalize::{Normalizer, DEFAULT_SUBJECT};
pub use processor::MailProcessor;
pub use service::{DispatchError, MailService};
pub use transport::{MailTransport, MockMailer, SmtpMailer, SmtpSettings};
