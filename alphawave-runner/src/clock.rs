//! Time source for the ingestors and the scheduler.
//!
//! Everything that waits (retry backoff, the polling interval) goes through a
//! [`Clock`], so tests drive a full crypto loop without sleeping.

use std::time::Duration;

use chrono::{DateTime, Utc};

pub trait Clock: Send {
    fn now(&self) -> DateTime<Utc>;
    fn sleep(&mut self, duration: Duration);
}

/// Wall clock backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Deterministic clock: `sleep` advances `now` instantly and records the call.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: DateTime<Utc>,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: start,
            sleeps: Vec::new(),
        }
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> &[Duration] {
        &self.sleeps
    }

    pub fn total_slept(&self) -> Duration {
        self.sleeps.iter().sum()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
        if let Ok(step) = chrono::Duration::from_std(duration) {
            self.now += step;
        }
    }
}
