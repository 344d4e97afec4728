//! Circuit breaker shared by a provider's requests.
//!
//! HTTP 403 (IP ban) trips the breaker immediately; repeated failures (429,
//! 5xx) trip it after `failure_threshold` consecutive failures. While open,
//! every request is refused until the cooldown expires.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open { tripped_at: Instant },
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    cooldown: Duration,
    failure_threshold: u32,
}

impl CircuitBreaker {
    pub fn new(cooldown: Duration, failure_threshold: u32) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
            }),
            cooldown,
            failure_threshold: failure_threshold.max(1),
        }
    }

    /// 30-minute cooldown, trips after 5 consecutive failures.
    pub fn default_provider() -> Self {
        Self::new(Duration::from_secs(30 * 60), 5)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // State is two plain fields; a poisoned lock still holds a usable value.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_allowed(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed => true,
            BreakerState::Open { tripped_at } => {
                if tripped_at.elapsed() >= self.cooldown {
                    inner.state = BreakerState::Closed;
                    inner.consecutive_failures = 0;
                    tracing::info!("circuit breaker cooldown expired, closing");
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        self.lock().consecutive_failures = 0;
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures += 1;
        if inner.consecutive_failures >= self.failure_threshold
            && inner.state == BreakerState::Closed
        {
            tracing::warn!(
                failures = inner.consecutive_failures,
                "circuit breaker tripped after consecutive failures"
            );
            inner.state = BreakerState::Open {
                tripped_at: Instant::now(),
            };
        }
    }

    /// Trip immediately (403 Forbidden / IP ban).
    pub fn trip(&self) {
        tracing::warn!("circuit breaker tripped by provider ban");
        self.lock().state = BreakerState::Open {
            tripped_at: Instant::now(),
        };
    }

    /// Remaining cooldown time (zero if not tripped).
    pub fn remaining_cooldown(&self) -> Duration {
        match self.lock().state {
            BreakerState::Closed => Duration::ZERO,
            BreakerState::Open { tripped_at } => self.cooldown.saturating_sub(tripped_at.elapsed()),
        }
    }
}
