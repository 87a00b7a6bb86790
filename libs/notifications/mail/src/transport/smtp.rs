//! SMTP delivery sink using lettre.

use super::MailTransport;
use crate::error::DeliveryError;
use crate::models::EmailMessage;
use async_trait::async_trait;
use core_config::{env_optional, env_or_default, ConfigError, FromEnv};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

/// SMTP credentials and addressing defaults.
///
/// Loaded once at startup and immutable afterwards. Completeness is only
/// enforced at first send or health check, so the process can boot without a
/// mail configuration.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub domain: String,
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_email: Option<String>,
}

impl FromEnv for SmtpSettings {
    /// Reads from environment variables:
    /// - `EMAIL_DOMAIN`: defaults to "gmail.com"
    /// - `EMAIL_HOST`, `EMAIL_USERNAME`, `EMAIL_PASSWORD`: no defaults,
    ///   checked at first use
    /// - `EMAIL_PORT`: defaults to 587
    /// - `FROM_EMAIL`: optional sender override
    fn from_env() -> Result<Self, ConfigError> {
        let port = env_or_default("EMAIL_PORT", "587")
            .parse()
            .map_err(|e| ConfigError::ParseError {
                key: "EMAIL_PORT".to_string(),
                details: format!("{}", e),
            })?;

        Ok(Self {
            domain: env_or_default("EMAIL_DOMAIN", "gmail.com"),
            host: env_optional("EMAIL_HOST"),
            port,
            username: env_optional("EMAIL_USERNAME"),
            password: env_optional("EMAIL_PASSWORD"),
            from_email: env_optional("FROM_EMAIL"),
        })
    }
}

impl SmtpSettings {
    /// Sender address: the configured from address, or `noreply@{domain}`.
    pub fn from_address(&self) -> String {
        self.from_email
            .clone()
            .unwrap_or_else(|| format!("noreply@{}", self.domain))
    }

    /// Domain, host, port, username and password must all be present before
    /// a session can be opened.
    fn require(&self) -> Result<(&str, &str, &str), DeliveryError> {
        if self.domain.is_empty() {
            return Err(DeliveryError::Config("EMAIL_DOMAIN"));
        }
        let host = self
            .host
            .as_deref()
            .ok_or(DeliveryError::Config("EMAIL_HOST"))?;
        if self.port == 0 {
            return Err(DeliveryError::Config("EMAIL_PORT"));
        }
        let username = self
            .username
            .as_deref()
            .ok_or(DeliveryError::Config("EMAIL_USERNAME"))?;
        let password = self
            .password
            .as_deref()
            .ok_or(DeliveryError::Config("EMAIL_PASSWORD"))?;
        Ok((host, username, password))
    }
}

/// SMTP delivery sink.
///
/// Every call opens its own scoped session: connect, STARTTLS, authenticate,
/// send, quit. Nothing is pooled and nothing is retried here.
pub struct SmtpMailer {
    settings: SmtpSettings,
}

impl SmtpMailer {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryError> {
        let (host, username, password) = self.settings.require()?;
        let credentials = Credentials::new(username.to_string(), password.to_string());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
            .port(self.settings.port)
            .credentials(credentials)
            .build();

        Ok(transport)
    }

    /// Build the outbound message.
    ///
    /// One To mailbox per recipient: the header renders as the comma-joined
    /// list and every address becomes an actual envelope recipient.
    fn build_message(&self, message: &EmailMessage) -> Result<Message, DeliveryError> {
        let from: Mailbox = self.settings.from_address().parse()?;

        let mut builder = Message::builder().from(from).subject(&message.subject);
        for recipient in &message.recipients {
            let to: Mailbox = recipient.parse()?;
            builder = builder.to(to);
        }

        let email = builder
            .header(ContentType::TEXT_HTML)
            .body(message.body_html.clone())?;

        Ok(email)
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn deliver(&self, message: &EmailMessage) -> Result<(), DeliveryError> {
        let email = self.build_message(message)?;
        let transport = self.transport()?;

        transport.send(email).await?;

        info!(
            recipients = ?message.recipients,
            subject = %message.subject,
            "Email sent"
        );
        Ok(())
    }

    async fn check_health(&self) -> Result<(), DeliveryError> {
        let transport = self.transport()?;
        let reachable = transport.test_connection().await?;
        if !reachable {
            return Err(DeliveryError::Transport(
                "SMTP server rejected the liveness probe".to_string(),
            ));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SmtpSettings {
        SmtpSettings {
            domain: "example.com".to_string(),
            host: Some("smtp.example.com".to_string()),
            port: 587,
            username: Some("mailer".to_string()),
            password: Some("secret".to_string()),
            from_email: None,
        }
    }

    fn message(recipients: &[&str]) -> EmailMessage {
        EmailMessage {
            recipients: recipients.iter().map(|r| r.to_string()).collect(),
            subject: "Greetings".to_string(),
            body_html: "<p>Hello</p>".to_string(),
        }
    }

    #[test]
    fn test_settings_from_env_applies_defaults() {
        temp_env::with_vars(
            [
                ("EMAIL_DOMAIN", None::<&str>),
                ("EMAIL_HOST", None),
                ("EMAIL_PORT", None),
                ("EMAIL_USERNAME", None),
                ("EMAIL_PASSWORD", None),
                ("FROM_EMAIL", None),
            ],
            || {
                let settings = SmtpSettings::from_env().unwrap();
                assert_eq!(settings.domain, "gmail.com");
                assert_eq!(settings.port, 587);
                assert!(settings.host.is_none());
            },
        );
    }

    #[test]
    fn test_settings_load_succeeds_with_missing_credentials() {
        // Completeness is checked at first use, not at load.
        temp_env::with_vars([("EMAIL_HOST", None::<&str>)], || {
            assert!(SmtpSettings::from_env().is_ok());
        });
    }

    #[test]
    fn test_from_address_falls_back_to_noreply() {
        assert_eq!(settings().from_address(), "noreply@example.com");

        let mut custom = settings();
        custom.from_email = Some("alerts@example.com".to_string());
        assert_eq!(custom.from_address(), "alerts@example.com");
    }

    #[test]
    fn test_every_recipient_is_an_envelope_recipient() {
        let mailer = SmtpMailer::new(settings());
        let email = mailer
            .build_message(&message(&["a@x.com", "b@y.com", "c@z.com"]))
            .unwrap();

        let envelope: Vec<String> = email
            .envelope()
            .to()
            .iter()
            .map(|address| address.to_string())
            .collect();
        assert_eq!(envelope, vec!["a@x.com", "b@y.com", "c@z.com"]);
    }

    #[test]
    fn test_to_header_is_comma_joined() {
        let mailer = SmtpMailer::new(settings());
        let email = mailer.build_message(&message(&["a@x.com", "b@y.com"])).unwrap();

        let rendered = String::from_utf8_lossy(&email.formatted()).to_string();
        assert!(rendered.contains("To: a@x.com, b@y.com"));
    }

    #[test]
    fn test_message_is_html() {
        let mailer = SmtpMailer::new(settings());
        let email = mailer.build_message(&message(&["a@x.com"])).unwrap();

        let rendered = String::from_utf8_lossy(&email.formatted()).to_string();
        assert!(rendered.contains("Content-Type: text/html"));
    }

    #[tokio::test]
    async fn test_missing_host_is_a_config_error() {
        let mut incomplete = settings();
        incomplete.host = None;
        let mailer = SmtpMailer::new(incomplete);

        let err = mailer.deliver(&message(&["a@x.com"])).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Config("EMAIL_HOST")));
    }

    #[tokio::test]
    async fn test_missing_password_fails_health_check() {
        let mut incomplete = settings();
        incomplete.password = None;
        let mailer = SmtpMailer::new(incomplete);

        let err = mailer.check_health().await.unwrap_err();
        assert!(matches!(err, DeliveryError::Config("EMAIL_PASSWORD")));
    }
}
