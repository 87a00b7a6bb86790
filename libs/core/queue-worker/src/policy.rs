//! Reconnect policies for consumer connections.
//!
//! The two policies reflect a deliberate difference between broker types:
//! a log-style consumer keeps retrying forever because the broker may simply
//! not be up yet, while a broker-style consumer makes a bounded attempt and
//! leaves restart decisions to its supervisor.

use std::time::Duration;

/// How a consumer (re)establishes its broker connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Retry forever, doubling the delay after each failure up to a ceiling.
    InfiniteBackoff { initial: Duration, max: Duration },

    /// A fixed number of attempts, each bounded by a timeout; give up after
    /// the last one.
    BoundedAttempts { attempts: u32, timeout: Duration },
}

impl ReconnectPolicy {
    /// The default infinite policy: delays double from 1s up to 30s.
    pub fn infinite_backoff() -> Self {
        Self::InfiniteBackoff {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
        }
    }

    /// A bounded policy with the given number of attempts.
    pub fn bounded(attempts: u32, timeout: Duration) -> Self {
        Self::BoundedAttempts { attempts, timeout }
    }

    /// A single connection attempt bounded by `timeout`.
    pub fn single_attempt(timeout: Duration) -> Self {
        Self::bounded(1, timeout)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::infinite_backoff()
    }
}

/// Exponential backoff state for one connection cycle.
///
/// Delays strictly double from `initial` and never exceed `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    delay: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { delay: initial, max }
    }

    /// The delay to wait before the next attempt.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.delay;
        self.delay = (self.delay * 2).min(self.max);
        delay
    }
}
