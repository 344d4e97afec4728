//! Equity ingestor: one batch run over the domestic and foreign universes.
//!
//! For each symbol, fetch the trailing window of daily bars (with bounded
//! retries), normalise, and union per market in universe order. One failed
//! symbol never stops the batch.

use std::path::PathBuf;

use chrono::Duration as ChronoDuration;

use alphawave_core::data::{DataError, DataProvider, DownloadProgress, MarketUniverse, RetryPolicy};

use crate::clock::Clock;
use crate::ingest::{normalize_symbol_bars, Collected, IngestError, IngestReport};

pub struct EquityIngestor<'a> {
    provider: &'a dyn DataProvider,
    retry: RetryPolicy,
    lookback_days: u32,
    data_dir: PathBuf,
}

impl<'a> EquityIngestor<'a> {
    pub fn new(
        provider: &'a dyn DataProvider,
        retry: RetryPolicy,
        lookback_days: u32,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            provider,
            retry,
            lookback_days,
            data_dir: data_dir.into(),
        }
    }

    /// Fetch every symbol of `universe` and replace its file.
    pub fn run_market(
        &self,
        universe: &MarketUniverse,
        clock: &mut dyn Clock,
        progress: &dyn DownloadProgress,
    ) -> Result<IngestReport, IngestError> {
        let end = clock.now().date_naive();
        let start = end - ChronoDuration::days(i64::from(self.lookback_days));
        let symbols = universe.distinct_symbols();
        let total = symbols.len();
        let market = universe.market;

        tracing::info!(%market, symbols = total, %start, %end, "equity ingest started");

        let mut collected = Collected::default();
        for (i, symbol) in symbols.iter().enumerate() {
            progress.on_start(symbol, i, total);
            // A blocked provider fails the remaining symbols without spending retries.
            if !self.provider.is_available() {
                let err = DataError::CircuitBreakerTripped;
                collected.push_failure(symbol, err.to_string());
                progress.on_complete(symbol, i, total, &Err(err));
                continue;
            }
            let fetched = self.retry.run(symbol, &mut |d| clock.sleep(d), |_| {
                self.provider.fetch(symbol, start, end)
            });

            match fetched {
                Ok(result) => {
                    progress.on_complete(symbol, i, total, &Ok(()));
                    let group = normalize_symbol_bars(symbol, market, result.bars);
                    collected.push_success(symbol, group);
                }
                Err(e) => {
                    let reason = e.to_string();
                    progress.on_complete(symbol, i, total, &Err(e));
                    collected.push_failure(symbol, reason);
                }
            }
        }

        progress.on_batch_complete(collected.succeeded.len(), collected.failed.len(), total);
        collected.write(universe, &self.data_dir)
    }

    /// Run every given universe; each market succeeds or fails on its own.
    pub fn run_all(
        &self,
        universes: &[&MarketUniverse],
        clock: &mut dyn Clock,
        progress: &dyn DownloadProgress,
    ) -> Vec<Result<IngestReport, IngestError>> {
        universes
            .iter()
            .map(|u| self.run_market(u, clock, progress))
            .collect()
    }
}
