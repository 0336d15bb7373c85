//! Timeout settings for outbound fetches.

use std::time::Duration;

/// Timeouts applied to one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// TCP/TLS connect timeout, set on the underlying client.
    pub connect: Duration,
    /// Budget for a single attempt, including reading the body.
    pub attempt: Duration,
}

impl TimeoutConfig {
    pub fn new(connect: Duration, attempt: Duration) -> Self {
        Self { connect, attempt }
    }

    /// Derive both timeouts from a single attempt budget.
    pub fn from_attempt(attempt: Duration) -> Self {
        Self {
            connect: attempt / 4,
            attempt,
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(2),
            attempt: Duration::from_secs(10),
        }
    }
}
