//! Bounded retry for collaborator calls
//!
//! Only errors that report themselves as retryable are tried again. Two
//! limits apply: the number of retries and the total elapsed time tracked by
//! the backoff schedule. Whichever runs out first ends the loop.

use std::future::Future;
use std::time::Duration;

use backoff::{backoff::Backoff, ExponentialBackoff};

use crate::config::ReasoningConfig;
use crate::error::{Result, ServiceError};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt; 0 disables retrying
    pub max_retries: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    /// Jitter, as a fraction of each interval
    pub randomization_factor: f64,
    pub max_elapsed_time: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(10),
            multiplier: 2.0,
            randomization_factor: 0.2,
            max_elapsed_time: Some(Duration::from_secs(30)),
        }
    }
}

impl From<&ReasoningConfig> for RetryConfig {
    fn from(config: &ReasoningConfig) -> Self {
        let max_interval = Duration::from_millis(config.max_retry_delay_ms);
        let per_attempt = max_interval + config.timeout();

        Self {
            max_retries: config.max_retries,
            initial_interval: Duration::from_millis(config.initial_retry_delay_ms),
            max_interval,
            max_elapsed_time: Some(per_attempt.saturating_mul(config.max_retries.saturating_add(1))),
            ..Self::default()
        }
    }
}

impl RetryConfig {
    /// A fresh backoff schedule starting at the initial interval
    fn schedule(&self) -> ExponentialBackoff {
        let mut schedule = ExponentialBackoff {
            current_interval: self.initial_interval,
            initial_interval: self.initial_interval,
            max_interval: self.max_interval,
            multiplier: self.multiplier,
            randomization_factor: self.randomization_factor,
            max_elapsed_time: self.max_elapsed_time,
            ..ExponentialBackoff::default()
        };
        schedule.reset();
        schedule
    }
}

/// Runs an async operation under a `RetryConfig`
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Call `operation` until it succeeds, fails permanently, or a limit is hit
    ///
    /// An error returned after one or more retries carries an `attempts`
    /// context value with the number of retries made.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut schedule = self.config.schedule();
        let mut retries = 0u32;

        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() || retries >= self.config.max_retries {
                return Err(give_up(err, retries));
            }

            let Some(delay) = schedule.next_backoff() else {
                log::error!("Retry time budget spent after {} retries", retries);
                return Err(give_up(err, retries));
            };

            retries += 1;
            log::warn!(
                "Retry {}/{} in {:?} after: {}",
                retries,
                self.config.max_retries,
                delay,
                err
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn give_up(err: ServiceError, retries: u32) -> ServiceError {
    if retries == 0 {
        return err;
    }
    log::error!("Collaborator call failed after {} retries: {}", retries, err);
    err.with_context_value("attempts", retries)
}
