// src/github/retry.rs
//! Exponential backoff around API calls

use super::error::ApiError;
use log::{debug, warn};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// How many times to try a call, how long to wait in between, and which
/// failures deserve another go.
///
/// The wait before attempt `n + 1` is `base_delay * 2^n`, so with a one
/// second base the pauses are 2s, 4s, ... No pause follows the last attempt.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    retryable: fn(&ApiError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), ApiError::is_rate_limited)
    }
}

impl RetryPolicy {
    /// `retryable` decides which failures get another attempt; everything else returns at once.
    pub fn new(max_attempts: u32, base_delay: Duration, retryable: fn(&ApiError) -> bool) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            retryable,
        }
    }

    /// Pause after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if (self.retryable)(&err) => {
                    if attempt >= self.max_attempts {
                        return Err(ApiError::RetriesExhausted {
                            attempts: attempt,
                            last: Box::new(err),
                        });
                    }
                    let wait = self.delay_after(attempt);
                    if let ApiError::RateLimited { reset: Some(reset), .. } = &err {
                        warn!("Rate limit resets at {}", reset.to_rfc3339());
                    }
                    println!("Rate limited. Retrying in {}s...", wait.as_secs_f64());
                    debug!("Attempt {}/{} failed: {}", attempt, self.max_attempts, err);
                    sleep(wait).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
