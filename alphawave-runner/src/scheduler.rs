//! Polling loop for the crypto ingestor.
//!
//! Explicit loop over an injectable [`Clock`] with a shared shutdown flag.
//! Cycle errors are logged and the loop carries on to the next sleep; only
//! shutdown or the cycle cap ends it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::ingest::{IngestError, IngestReport};

/// Longest single sleep; the shutdown flag is checked between slices.
const SLEEP_SLICE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: Duration,
    max_cycles: Option<u64>,
    shutdown: Arc<AtomicBool>,
}

/// Counters for a finished loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerSummary {
    pub cycles: u64,
    pub failed_cycles: u64,
    pub unchanged_cycles: u64,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_cycles: None,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop after `n` cycles (`--once` is `Some(1)`).
    pub fn with_max_cycles(mut self, n: Option<u64>) -> Self {
        self.max_cycles = n;
        self
    }

    /// Handle that stops the loop at the next cycle boundary or sleep slice.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    fn stopping(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub fn run<F>(&self, clock: &mut dyn Clock, mut cycle: F) -> SchedulerSummary
    where
        F: FnMut(&mut dyn Clock) -> Result<IngestReport, IngestError>,
    {
        let mut summary = SchedulerSummary::default();

        while !self.stopping() {
            let started = clock.now();
            match cycle(clock) {
                Ok(report) => {
                    if report.unchanged {
                        summary.unchanged_cycles += 1;
                        tracing::info!(cycle = summary.cycles + 1, "upstream data unchanged");
                    }
                    if report.is_partial() {
                        tracing::warn!(
                            cycle = summary.cycles + 1,
                            failed = report.failed.len(),
                            "cycle completed with skipped pairs"
                        );
                    }
                }
                Err(e) => {
                    summary.failed_cycles += 1;
                    tracing::error!(cycle = summary.cycles + 1, error = %e, "cycle failed");
                }
            }
            summary.cycles += 1;
            tracing::debug!(
                cycle = summary.cycles,
                elapsed_ms = (clock.now() - started).num_milliseconds(),
                "cycle finished"
            );

            if self.max_cycles.is_some_and(|max| summary.cycles >= max) {
                break;
            }
            self.sleep_interruptibly(clock);
        }

        tracing::info!(
            cycles = summary.cycles,
            failed = summary.failed_cycles,
            "scheduler stopped"
        );
        summary
    }

    fn sleep_interruptibly(&self, clock: &mut dyn Clock) {
        let mut remaining = self.interval;
        tracing::info!(seconds = remaining.as_secs(), "sleeping until next cycle");
        while !remaining.is_zero() && !self.stopping() {
            let step = remaining.min(SLEEP_SLICE);
            clock.sleep(step);
            remaining -= step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use alphawave_core::domain::Market;
    use chrono::{TimeZone, Utc};

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    fn failing(_: &mut dyn Clock) -> Result<IngestReport, IngestError> {
        Err(IngestError::AllSymbolsFailed {
            market: Market::Crypto,
            failures: Vec::new(),
        })
    }

    #[test]
    fn bounded_run_sleeps_between_cycles_only() {
        let mut clock = clock();
        let scheduler = Scheduler::new(Duration::from_secs(3)).with_max_cycles(Some(2));
        let summary = scheduler.run(&mut clock, failing);
        assert_eq!(summary.cycles, 2);
        assert_eq!(summary.failed_cycles, 2);
        // one interval, sliced into 1s sleeps
        assert_eq!(clock.total_slept(), Duration::from_secs(3));
        assert_eq!(clock.sleeps().len(), 3);
    }

    #[test]
    fn shutdown_flag_stops_the_loop() {
        let mut clock = clock();
        let scheduler = Scheduler::new(Duration::from_secs(60));
        let flag = scheduler.shutdown_flag();
        let mut calls = 0;
        let summary = scheduler.run(&mut clock, |_| {
            calls += 1;
            if calls == 3 {
                flag.store(true, Ordering::SeqCst);
            }
            failing(&mut ManualClock::new(Utc::now()))
        });
        assert_eq!(summary.cycles, 3);
        assert_eq!(clock.total_slept(), Duration::from_secs(120));
    }

    #[test]
    fn preset_shutdown_runs_nothing() {
        let mut clock = clock();
        let scheduler = Scheduler::new(Duration::from_secs(1));
        scheduler.shutdown_flag().store(true, Ordering::SeqCst);
        let summary = scheduler.run(&mut clock, failing);
        assert_eq!(summary.cycles, 0);
    }
}
