//! Retry execution with exponential backoff and jitter
//!
//! Provides a small retry runner for operations that may fail transiently.
//! The delay for attempt `n` (1-indexed) is
//! `min(max_delay, base_delay * 2^(n-1))`, randomized upward by a jitter
//! fraction to avoid synchronized retry storms.
//!
//! The runner never swallows the final error: the outcome carries the last
//! error produced by the operation together with the number of attempts, so
//! callers can attach diagnostic context before propagating.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

/// Backoff configuration for a retryable operation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts (initial try + retries).
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles per subsequent attempt.
    pub base_delay: Duration,
    /// Ceiling applied to the un-jittered delay.
    pub max_delay: Duration,
    /// Upward jitter fraction applied to the capped delay (0.3 = up to +30%).
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            jitter: 0.3,
        }
    }
}

impl RetryPolicy {
    /// Un-jittered delay after a failed attempt `n` (1-indexed).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let scaled = self.base_delay.saturating_mul(1u32 << exponent);
        scaled.min(self.max_delay)
    }

    /// Delay with jitter applied, ready to sleep on.
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let base = self.backoff_delay(attempt);
        if self.jitter <= 0.0 {
            return base;
        }
        let factor = 1.0 + rand::thread_rng().gen_range(0.0..self.jitter);
        base.mul_f64(factor)
    }
}

/// Result of a retried operation plus how many attempts it took.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

impl<T, E> RetryOutcome<T, E> {
    /// Consume the outcome and return only the result.
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Executes operations under a [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct RetryRunner {
    policy: RetryPolicy,
}

impl RetryRunner {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation`, retrying while `should_retry` approves the error and
    /// the attempt budget lasts.
    ///
    /// Non-retryable errors and the error of the final attempt are returned
    /// as-is in the outcome.
    pub async fn run<F, Fut, T, E, R>(&self, mut operation: F, should_retry: R) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(attempt, max_attempts, "executing retryable operation");

            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "operation succeeded after retry");
                    }
                    return RetryOutcome { result: Ok(value), attempts: attempt };
                }
                Err(error) => {
                    if attempt >= max_attempts || !should_retry(&error) {
                        return RetryOutcome { result: Err(error), attempts: attempt };
                    }

                    let delay = self.policy.jittered_delay(attempt);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, "operation failed, backing off");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
