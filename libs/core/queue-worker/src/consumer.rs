//! The generic consumer loop.
//!
//! One loop body serves every broker; the differences live in the
//! [`BrokerSource`] implementation and the [`ReconnectPolicy`]:
//!
//! - connection establishment follows the policy (infinite backoff or a
//!   bounded number of timed attempts)
//! - messages are pulled in receipt order and handed to the [`Processor`]
//! - per-message failures are logged and acknowledged, never fatal
//! - a broken connection either triggers a reconnect (infinite policy) or
//!   ends the loop with an error (bounded policy)
//! - the stream is closed on every exit path

use crate::error::ConsumerError;
use crate::policy::{Backoff, ReconnectPolicy};
use crate::processor::Processor;
use crate::source::{BrokerSource, InboundMessage, MessageStream};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Consumer loop configuration.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// When false the loop logs and returns immediately.
    pub enabled: bool,

    /// Connection establishment behavior.
    pub reconnect: ReconnectPolicy,

    /// Only messages carrying this key are handled; others are skipped
    /// silently. `None` disables the filter.
    pub message_key: Option<String>,

    /// Pause after each handled message, to bound throughput and avoid a
    /// tight loop on repeated failures.
    pub message_pause: Option<Duration>,

    /// Pause after releasing the connection, to avoid a tight restart loop.
    pub shutdown_pause: Option<Duration>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reconnect: ReconnectPolicy::default(),
            message_key: None,
            message_pause: None,
            shutdown_pause: None,
        }
    }
}

impl ConsumerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    pub fn with_message_key(mut self, key: impl Into<String>) -> Self {
        self.message_key = Some(key.into());
        self
    }

    pub fn with_message_pause(mut self, pause: Duration) -> Self {
        self.message_pause = Some(pause);
        self
    }

    pub fn with_shutdown_pause(mut self, pause: Duration) -> Self {
        self.shutdown_pause = Some(pause);
        self
    }
}

/// Why the listening phase ended.
enum ListenOutcome {
    Shutdown,
    Ended,
    Broken(ConsumerError),
}

/// Generic queue consumer.
///
/// Owns one broker subscription at a time and funnels accepted messages into
/// the processor.
pub struct QueueConsumer<S, P>
where
    S: BrokerSource,
    P: Processor,
{
    source: S,
    processor: P,
    config: ConsumerConfig,
}

impl<S, P> QueueConsumer<S, P>
where
    S: BrokerSource,
    P: Processor,
{
    pub fn new(source: S, processor: P, config: ConsumerConfig) -> Self {
        Self {
            source,
            processor,
            config,
        }
    }

    /// Run the consumer until shutdown, stream end, or (under a bounded
    /// policy) a connection failure.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), ConsumerError> {
        if !self.config.enabled {
            info!(
                source = self.source.name(),
                "Consumer is disabled by configuration, not starting"
            );
            return Ok(());
        }

        info!(
            source = self.source.name(),
            processor = self.processor.name(),
            "Starting queue consumer"
        );

        loop {
            let mut stream = match self.establish(&mut shutdown).await? {
                Some(stream) => stream,
                None => return Ok(()),
            };

            info!(source = self.source.name(), "Connected, listening for messages");

            let outcome = self.listen(&mut stream, &mut shutdown).await;

            // The connection is released on every exit path.
            stream.close().await;

            match outcome {
                ListenOutcome::Shutdown | ListenOutcome::Ended => {
                    if let Some(pause) = self.config.shutdown_pause {
                        tokio::time::sleep(pause).await;
                    }
                    info!(source = self.source.name(), "Queue consumer stopped");
                    return Ok(());
                }
                ListenOutcome::Broken(err) => match self.config.reconnect {
                    ReconnectPolicy::InfiniteBackoff { .. } => {
                        warn!(
                            source = self.source.name(),
                            error = %err,
                            "Connection lost, reconnecting"
                        );
                    }
                    ReconnectPolicy::BoundedAttempts { .. } => {
                        error!(
                            source = self.source.name(),
                            error = %err,
                            "Connection lost, exiting consumer"
                        );
                        return Err(err);
                    }
                },
            }
        }
    }

    /// Establish a connection according to the reconnect policy.
    ///
    /// Returns `Ok(None)` when shutdown was requested while connecting.
    async fn establish(
        &self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<Option<S::Stream>, ConsumerError> {
        match self.config.reconnect {
            ReconnectPolicy::InfiniteBackoff { initial, max } => {
                let mut backoff = Backoff::new(initial, max);
                loop {
                    let attempt = tokio::select! {
                        _ = shutdown.changed() => return Ok(None),
                        result = self.source.connect() => result,
                    };

                    match attempt {
                        Ok(stream) => return Ok(Some(stream)),
                        Err(err) => {
                            let delay = backoff.next_delay();
                            warn!(
                                source = self.source.name(),
                                error = %err,
                                retry_in_secs = delay.as_secs(),
                                "Connection failed, retrying"
                            );
                            tokio::select! {
                                _ = shutdown.changed() => return Ok(None),
                                _ = tokio::time::sleep(delay) => {}
                            }
                        }
                    }
                }
            }
            ReconnectPolicy::BoundedAttempts { attempts, timeout } => {
                let mut last_error = None;
                for attempt in 1..=attempts.max(1) {
                    match tokio::time::timeout(timeout, self.source.connect()).await {
                        Ok(Ok(stream)) => return Ok(Some(stream)),
                        Ok(Err(err)) => {
                            warn!(
                                source = self.source.name(),
                                attempt,
                                error = %err,
                                "Connection attempt failed"
                            );
                            last_error = Some(err);
                        }
                        Err(_) => {
                            warn!(
                                source = self.source.name(),
                                attempt,
                                timeout_secs = timeout.as_secs(),
                                "Connection attempt timed out"
                            );
                            last_error = Some(ConsumerError::connect(
                                self.source.name(),
                                "connection attempt timed out",
                            ));
                        }
                    }
                }
                error!(
                    source = self.source.name(),
                    attempts = attempts.max(1),
                    "Giving up on broker connection"
                );
                Err(last_error.unwrap_or_else(|| {
                    ConsumerError::connect(self.source.name(), "no connection attempts made")
                }))
            }
        }
    }

    /// Pull and handle messages until shutdown, stream end, or a broker
    /// error.
    ///
    /// The current message is always handled to completion before the loop
    /// observes cancellation, so an in-flight acknowledgment unit finishes.
    async fn listen(
        &self,
        stream: &mut S::Stream,
        shutdown: &mut watch::Receiver<bool>,
    ) -> ListenOutcome {
        loop {
            let next = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(
                            source = self.source.name(),
                            "Shutdown signal received, stopping consumer"
                        );
                        return ListenOutcome::Shutdown;
                    }
                    continue;
                }
                next = stream.next() => next,
            };

            match next {
                Ok(Some(message)) => self.handle(message).await,
                Ok(None) => {
                    info!(source = self.source.name(), "Message stream ended");
                    return ListenOutcome::Ended;
                }
                Err(err) => return ListenOutcome::Broken(err),
            }
        }
    }

    /// Handle one message as a single acknowledgment unit.
    ///
    /// The acknowledgment is issued exactly once, no matter which step
    /// failed; malformed payloads and failed deliveries are dropped by
    /// design.
    async fn handle(&self, message: InboundMessage) {
        let wanted = match &self.config.message_key {
            Some(expected) => message.key() == Some(expected.as_str()),
            None => true,
        };

        if wanted {
            match self.processor.process(message.payload()).await {
                Ok(()) => debug!(processor = self.processor.name(), "Message processed"),
                Err(err) if err.is_malformed() => {
                    warn!(
                        source = self.source.name(),
                        error = %err,
                        "Skipping malformed message"
                    );
                }
                Err(err) => {
                    error!(
                        source = self.source.name(),
                        error = %err,
                        "Message processing failed"
                    );
                }
            }
        }

        if let Err(err) = message.ack().await {
            error!(
                source = self.source.name(),
                error = %err,
                "Failed to acknowledge message"
            );
        }

        if let Some(pause) = self.config.message_pause {
            tokio::time::sleep(pause).await;
        }
    }
}
