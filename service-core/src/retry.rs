//! Whole-operation retry with exponential backoff.
//!
//! The operation is re-run from the beginning on each attempt. Callers that
//! aggregate multi-request results rely on this: a failed aggregation is
//! restarted, never resumed.

use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    /// Adds up to 25% on top of each delay.
    pub add_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Delays slept between attempts, one per retry.
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(|retry| self.delay(retry))
    }

    fn delay(&self, retry: u32) -> Duration {
        let scaled = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(retry as i32);
        let base = Duration::from_secs_f64(scaled.min(self.max_backoff.as_secs_f64()));

        if !self.add_jitter {
            return base;
        }

        base + base.mul_f64(rand::thread_rng().gen_range(0.0..0.25))
    }
}

/// Classifies failures as transient (worth re-running) or permanent.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Run `operation` until it succeeds, fails permanently, or the schedule of
/// `config` runs out.
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    operation: F,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let mut delays = config.schedule();
    let mut attempt = 1u32;

    loop {
        let error = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(operation = operation_name, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        if !error.is_retryable() {
            warn!(operation = operation_name, attempt, error = %error, "Permanent failure");
            return Err(error);
        }

        let Some(delay) = delays.next() else {
            warn!(operation = operation_name, attempt, error = %error, "Retries exhausted");
            return Err(error);
        };

        warn!(
            operation = operation_name,
            attempt,
            error = %error,
            delay_ms = delay.as_millis() as u64,
            "Transient failure, retrying"
        );
        sleep(delay).await;
        attempt += 1;
    }
}
