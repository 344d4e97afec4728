//! Bounded retry with exponential backoff for provider fetches.
//!
//! Delay before attempt `n` (1-based retry count) is
//! `min(base * 2^(n-1), max) + U(0, jitter)`. A `RateLimited` error with a
//! retry-after hint raises the delay to that hint, still capped at `max`.
//! Only transient errors are retried.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::provider::DataError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 disables retrying).
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Upper bound of the uniform random jitter added to each delay.
    pub jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            jitter_ms: 250,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 0,
            max_delay_ms: 0,
            jitter_ms: 0,
        }
    }

    /// Backoff before retry number `retry` (1-based), without jitter.
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = 2u64.saturating_pow(retry - 1);
        let ms = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(ms)
    }

    fn delay_for(&self, retry: u32, last_error: Option<&DataError>) -> Duration {
        let mut delay = self.backoff(retry);
        if let Some(DataError::RateLimited { retry_after_secs }) = last_error {
            let hinted = Duration::from_secs(*retry_after_secs)
                .min(Duration::from_millis(self.max_delay_ms));
            delay = delay.max(hinted);
        }
        if self.jitter_ms > 0 {
            delay += Duration::from_millis(rand::thread_rng().gen_range(0..=self.jitter_ms));
        }
        delay
    }

    /// Run `op` until it succeeds, fails permanently, or retries are exhausted.
    ///
    /// `sleep` is called between attempts; callers pass the scheduler clock so
    /// tests never block. `op` receives the 0-based attempt number.
    pub fn run<T>(
        &self,
        label: &str,
        sleep: &mut dyn FnMut(Duration),
        mut op: impl FnMut(u32) -> Result<T, DataError>,
    ) -> Result<T, DataError> {
        let mut last_error: Option<DataError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.delay_for(attempt, last_error.as_ref());
                tracing::debug!(label, attempt, delay_ms = delay.as_millis() as u64, "backing off");
                sleep(delay);
            }

            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    tracing::warn!(label, attempt, error = %err, "transient fetch failure, retrying");
                    last_error = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}
