//! Retry policies for outbound fetches.

use std::time::Duration;

use crate::client::FetchError;

/// Delay between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackoffStrategy {
    None,
    Fixed(Duration),
    /// Doubles per attempt, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

impl BackoffStrategy {
    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Fixed(d) => *d,
            Self::Exponential { base, max } => {
                let factor = 2u32.saturating_pow(attempt);
                base.saturating_mul(factor).min(*max)
            }
        }
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_secs(2),
        }
    }
}

/// A class of failure worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryCondition {
    StatusCode(u16),
    /// Any 5xx.
    ServerError,
    Timeout,
    ConnectionError,
}

impl RetryCondition {
    pub fn matches(&self, error: &FetchError) -> bool {
        match (self, error) {
            (Self::StatusCode(code), FetchError::Http { status, .. }) => status == code,
            (Self::ServerError, FetchError::Http { status, .. }) => (500..600).contains(status),
            (Self::Timeout, FetchError::Timeout { .. }) => true,
            (Self::ConnectionError, FetchError::Connection(_)) => true,
            _ => false,
        }
    }
}

/// How many times to retry, on what, and with which backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub backoff: BackoffStrategy,
    pub retry_on: Vec<RetryCondition>,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: BackoffStrategy::default(),
            retry_on: vec![
                RetryCondition::ServerError,
                RetryCondition::Timeout,
                RetryCondition::ConnectionError,
            ],
        }
    }

    /// Never retry.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: BackoffStrategy::None,
            retry_on: Vec::new(),
        }
    }

    pub fn with_backoff(mut self, strategy: BackoffStrategy) -> Self {
        self.backoff = strategy;
        self
    }

    pub fn with_conditions(mut self, conditions: Vec<RetryCondition>) -> Self {
        self.retry_on = conditions;
        self
    }

    /// Whether a failure on retry number `attempt` (0 for the first
    /// attempt) should be followed by another attempt.
    pub fn should_retry(&self, error: &FetchError, attempt: u32) -> bool {
        attempt < self.max_retries && self.retry_on.iter().any(|c| c.matches(error))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2)
    }
}
