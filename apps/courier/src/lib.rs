//! Courier Mail Service
//!
//! A notification dispatch service that accepts email-send requests from
//! three independent sources and delivers them over SMTP.
//!
//! ## Architecture
//!
//! ```text
//! HTTP POST /api/send-email ─┐
//! Kafka topic (key-filtered) ┼─▸ Normalizer ─▸ SMTP delivery sink
//! AMQP queue (explicit acks) ┘
//! ```
//!
//! Both queue consumers run as independent background tasks alongside the
//! HTTP server. The Kafka consumer reconnects forever with exponential
//! backoff; the AMQP consumer makes a single bounded connection attempt and
//! exits on failure. Neither can stall the other or the synchronous path.

mod api;
mod config;
mod state;

use config::Config;
use eyre::{Result, WrapErr};
use mail::{MailProcessor, MailService, MailTransport, Normalizer, Origin, SmtpMailer};
use queue_worker::{
    AmqpSource, ConsumerConfig, KafkaSource, QueueConsumer, ReconnectPolicy,
};
use state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Run the mail service.
///
/// This is the main entry point. It:
/// 1. Sets up structured logging (env-aware: JSON for prod, pretty for dev)
/// 2. Loads configuration from environment variables
/// 3. Spawns both queue consumers as background tasks
/// 4. Serves the HTTP API with graceful shutdown handling
///
/// # Errors
///
/// Returns an error if configuration loading fails, the listen address is
/// unavailable, or the HTTP server fails. Consumer failures are logged but
/// never take the process down.
pub async fn run() -> Result<()> {
    let config = Config::from_env().wrap_err("Failed to load configuration")?;

    core_config::tracing::init_tracing(&config.environment);

    info!("Starting courier mail service");
    info!("Environment: {:?}", config.environment);

    let transport: Arc<dyn MailTransport> = Arc::new(SmtpMailer::new(config.smtp.clone()));
    let normalizer = Normalizer::default();
    let service = MailService::new(normalizer.clone(), transport.clone());

    // The shutdown signal is the only cancellation trigger; consumers and
    // the HTTP server all watch the same channel.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let kafka_task = spawn_kafka_consumer(&config, &normalizer, &transport, shutdown_rx.clone());
    let amqp_task = spawn_amqp_consumer(&config, &normalizer, &transport, shutdown_rx.clone());

    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let state = AppState { mail: service };
    let app = api::router(state);

    let address = config.server.address();
    let listener = TcpListener::bind(&address)
        .await
        .wrap_err_with(|| format!("Failed to bind HTTP server to {}", address))?;
    info!(address = %address, "HTTP server listening");

    let mut serve_shutdown = shutdown_rx.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = serve_shutdown.changed().await;
        })
        .await
        .wrap_err("HTTP server failed")?;

    // Let in-flight consumer iterations finish their current message.
    let _ = tokio::join!(kafka_task, amqp_task);

    info!("Courier mail service stopped");
    Ok(())
}

/// Spawn the Kafka consumer task.
///
/// Key-filtered, auto-committed, and configured to reconnect forever with
/// exponential backoff; the broker may simply not be up yet.
fn spawn_kafka_consumer(
    config: &Config,
    normalizer: &Normalizer,
    transport: &Arc<dyn MailTransport>,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let consumer = QueueConsumer::new(
        KafkaSource::new(config.kafka.clone()),
        MailProcessor::new(normalizer.clone(), transport.clone(), Origin::Kafka),
        ConsumerConfig::default()
            .with_enabled(config.kafka.enabled)
            .with_message_key(config.kafka.message_key.clone())
            .with_shutdown_pause(Duration::from_secs(3)),
    );

    tokio::spawn(async move {
        if let Err(e) = consumer.run(shutdown).await {
            error!(error = %e, "Kafka consumer stopped with error");
        }
    })
}

/// Spawn the AMQP consumer task.
///
/// One bounded connection attempt; on failure the task exits and leaves any
/// restart decision to the operator. A short pause follows every message to
/// bound throughput.
fn spawn_amqp_consumer(
    config: &Config,
    normalizer: &Normalizer,
    transport: &Arc<dyn MailTransport>,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let consumer = QueueConsumer::new(
        AmqpSource::new(config.amqp.clone()),
        MailProcessor::new(normalizer.clone(), transport.clone(), Origin::Amqp),
        ConsumerConfig::default()
            .with_enabled(config.amqp.enabled)
            .with_reconnect_policy(ReconnectPolicy::single_attempt(Duration::from_secs(5)))
            .with_message_pause(Duration::from_secs(3)),
    );

    tokio::spawn(async move {
        if let Err(e) = consumer.run(shutdown).await {
            error!(error = %e, "AMQP consumer stopped with error");
        }
    })
}

/// Wait for a shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        },
    }
}
