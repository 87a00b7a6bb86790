//! Shared application state for request handlers.

use mail::MailService;

/// Cloned per handler; the service holds the normalizer and an Arc to the
/// delivery transport, so clones are cheap.
#[derive(Clone)]
pub struct AppState {
    pub mail: MailService,
}
