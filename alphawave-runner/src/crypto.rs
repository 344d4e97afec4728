//! Crypto ingestor: one fetch-and-overwrite cycle over the configured pairs.
//!
//! Each cycle re-fetches every pair in full and supersedes the previous file
//! wholesale. The polling loop around it lives in [`crate::scheduler`].

use std::path::PathBuf;

use alphawave_core::config::CryptoConfig;
use alphawave_core::data::{ExchangeProvider, MarketUniverse, RetryPolicy};

use crate::clock::Clock;
use crate::ingest::{normalize_symbol_bars, Collected, IngestError, IngestReport};

pub struct CryptoIngestor<'a> {
    exchange: &'a dyn ExchangeProvider,
    universe: MarketUniverse,
    granularity: String,
    limit: u32,
    retry: RetryPolicy,
    data_dir: PathBuf,
}

impl<'a> CryptoIngestor<'a> {
    pub fn new(
        exchange: &'a dyn ExchangeProvider,
        config: &CryptoConfig,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            exchange,
            universe: config.universe.clone(),
            granularity: config.granularity.clone(),
            limit: config.limit,
            retry: config.retry,
            data_dir: data_dir.into(),
        }
    }

    pub fn universe(&self) -> &MarketUniverse {
        &self.universe
    }

    /// Fetch all pairs once and write the union.
    ///
    /// A pair that exhausts its retries is skipped for this cycle only.
    pub fn run_cycle(&self, clock: &mut dyn Clock) -> Result<IngestReport, IngestError> {
        let market = self.universe.market;
        let mut collected = Collected::default();

        for pair in self.universe.distinct_symbols() {
            let fetched = self.retry.run(pair, &mut |d| clock.sleep(d), |attempt| {
                if attempt > 0 {
                    tracing::debug!(pair, attempt, "retrying pair");
                }
                self.exchange.fetch_ohlcv(pair, &self.granularity, self.limit)
            });

            match fetched {
                Ok(result) => {
                    let group = normalize_symbol_bars(pair, market, result.bars);
                    collected.push_success(pair, group);
                }
                Err(e) => collected.push_failure(pair, e.to_string()),
            }
        }

        collected.write(&self.universe, &self.data_dir)
    }
}
