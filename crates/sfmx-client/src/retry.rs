//! Retry policy with exponential backoff and jitter.

use rand::Rng;
use std::time::Duration;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not counting the initial try).
    pub max_attempts: u32,
    /// Initial delay before first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff strategy to use.
    pub backoff: BackoffStrategy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff: BackoffStrategy::ExponentialWithJitter { factor: 2.0 },
        }
    }
}

impl RetryConfig {
    /// Set the maximum number of retry attempts.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the backoff strategy.
    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Compute the delay before the given 0-indexed retry attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff
            .delay(attempt, self.initial_delay, self.max_delay)
    }
}

/// Backoff strategy for determining retry delays.
#[derive(Debug, Clone, Copy)]
pub enum BackoffStrategy {
    /// Constant delay between retries.
    Constant,
    /// Linear increase in delay (delay * attempt).
    Linear,
    /// Exponential increase in delay (delay * factor^attempt).
    Exponential { factor: f64 },
    /// Exponential with random jitter to avoid thundering herd.
    ExponentialWithJitter { factor: f64 },
}

impl BackoffStrategy {
    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay(&self, attempt: u32, initial_delay: Duration, max_delay: Duration) -> Duration {
        let delay = match self {
            BackoffStrategy::Constant => initial_delay,
            BackoffStrategy::Linear => initial_delay * (attempt + 1),
            BackoffStrategy::Exponential { factor } => {
                let multiplier = factor.powi(attempt as i32);
                Duration::from_secs_f64(initial_delay.as_secs_f64() * multiplier)
            }
            BackoffStrategy::ExponentialWithJitter { factor } => {
                let base_multiplier = factor.powi(attempt as i32);
                let base_delay = initial_delay.as_secs_f64() * base_multiplier;

                let mut rng = rand::rng();
                let jitter = rng.random::<f64>() * base_delay;

                Duration::from_secs_f64(base_delay + jitter)
            }
        };

        std::cmp::min(delay, max_delay)
    }
}
