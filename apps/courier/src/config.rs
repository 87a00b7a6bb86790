use core_config::server::ServerConfig;
use core_config::{Environment, FromEnv};
use mail::SmtpSettings;
use queue_worker::{AmqpConfig, KafkaConfig};

/// Application configuration composed from the library configs.
///
/// Loaded once at startup; each component receives its slice at
/// construction.
#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub smtp: SmtpSettings,
    pub kafka: KafkaConfig,
    pub amqp: AmqpConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            smtp: SmtpSettings::from_env()?,
            kafka: KafkaConfig::from_env()?,
            amqp: AmqpConfig::from_env()?,
            environment: Environment::from_env(),
        })
    }
}
