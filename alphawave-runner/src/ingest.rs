//! Pieces shared by the equity and crypto ingestors.
//!
//! Turning a provider response into a writable symbol group:
//! 1. Stamp symbol and market on every raw bar
//! 2. Drop bars that fail validation (counted, never kept)
//! 3. Sort ascending and drop duplicate timestamps (first one wins)

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use alphawave_core::data::{read_meta, write_table, MarketUniverse, RawBar, TableError, TableMeta};
use alphawave_core::domain::{Market, PriceBar};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("every {market} symbol failed; previous file left untouched")]
    AllSymbolsFailed {
        market: Market,
        failures: Vec<SymbolFailure>,
    },

    #[error("writing {market} table: {source}")]
    Write {
        market: Market,
        #[source]
        source: TableError,
    },
}

/// A symbol that produced no usable bars this run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolFailure {
    pub symbol: String,
    pub reason: String,
}

/// A symbol that made it into the written table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolOutcome {
    pub symbol: String,
    pub bars: usize,
    /// Bars dropped for failing validation.
    pub rejected: usize,
    /// Repeated timestamps removed after sorting.
    pub duplicates: usize,
}

/// What one ingest run did for one market.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub market: Market,
    pub path: PathBuf,
    pub succeeded: Vec<SymbolOutcome>,
    pub failed: Vec<SymbolFailure>,
    pub meta: TableMeta,
    /// The written bytes hash the same as the previous file.
    pub unchanged: bool,
}

impl IngestReport {
    pub fn rows_written(&self) -> usize {
        self.meta.row_count
    }

    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Bars for one symbol, ready to write.
#[derive(Debug, Clone)]
pub struct SymbolBars {
    pub bars: Vec<PriceBar>,
    pub rejected: usize,
    pub duplicates: usize,
}

pub fn normalize_symbol_bars(symbol: &str, market: Market, raw: Vec<RawBar>) -> SymbolBars {
    let mut rejected = 0;
    let mut bars: Vec<PriceBar> = Vec::with_capacity(raw.len());
    for r in raw {
        let bar = r.into_price_bar(symbol, market);
        match bar.validate() {
            Ok(()) => bars.push(bar),
            Err(e) => {
                tracing::warn!(symbol, error = %e, "dropping invalid bar");
                rejected += 1;
            }
        }
    }

    bars.sort_by_key(|b| b.timestamp);
    let before = bars.len();
    bars.dedup_by_key(|b| b.timestamp);
    let duplicates = before - bars.len();
    if duplicates > 0 {
        tracing::debug!(symbol, duplicates, "dropped duplicate timestamps");
    }

    SymbolBars {
        bars,
        rejected,
        duplicates,
    }
}

/// Symbol groups collected during a run, in universe order.
#[derive(Debug, Default)]
pub(crate) struct Collected {
    pub bars: Vec<PriceBar>,
    pub succeeded: Vec<SymbolOutcome>,
    pub failed: Vec<SymbolFailure>,
}

impl Collected {
    pub fn push_success(&mut self, symbol: &str, group: SymbolBars) {
        if group.bars.is_empty() {
            self.push_failure(symbol, "no valid bars after validation".into());
            return;
        }
        self.succeeded.push(SymbolOutcome {
            symbol: symbol.to_string(),
            bars: group.bars.len(),
            rejected: group.rejected,
            duplicates: group.duplicates,
        });
        self.bars.extend(group.bars);
    }

    pub fn push_failure(&mut self, symbol: &str, reason: String) {
        tracing::warn!(symbol, %reason, "symbol skipped");
        self.failed.push(SymbolFailure {
            symbol: symbol.to_string(),
            reason,
        });
    }

    /// Write the union for `universe` under `data_dir`.
    ///
    /// With no successful symbol the previous file is left in place.
    pub fn write(
        self,
        universe: &MarketUniverse,
        data_dir: &std::path::Path,
    ) -> Result<IngestReport, IngestError> {
        let market = universe.market;
        if self.succeeded.is_empty() {
            return Err(IngestError::AllSymbolsFailed {
                market,
                failures: self.failed,
            });
        }

        let path = universe.path_in(data_dir);
        let previous_hash = read_meta(&path).map(|m| m.content_hash);
        let meta = write_table(&path, market, &universe.label, &self.bars)
            .map_err(|source| IngestError::Write { market, source })?;
        let unchanged = previous_hash.as_deref() == Some(meta.content_hash.as_str());

        tracing::info!(
            %market,
            path = %path.display(),
            rows = meta.row_count,
            symbols = self.succeeded.len(),
            failed = self.failed.len(),
            unchanged,
            "market table written"
        );

        Ok(IngestReport {
            market,
            path,
            succeeded: self.succeeded,
            failed: self.failed,
            meta,
            unchanged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw(day: u32, close: f64) -> RawBar {
        RawBar {
            timestamp: NaiveDate::from_ymd_opt(2024, 5, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 10.0,
        }
    }

    #[test]
    fn sorts_dedups_and_drops_invalid() {
        let out = normalize_symbol_bars(
            "ETH/USDT",
            Market::Crypto,
            vec![raw(3, 30.0), raw(1, 10.0), raw(2, f64::NAN), raw(3, 31.0), raw(4, 0.0)],
        );
        assert_eq!(out.rejected, 2);
        assert_eq!(out.duplicates, 1);
        let closes: Vec<f64> = out.bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![10.0, 30.0]);
        assert!(out.bars.iter().all(|b| b.symbol == "ETH/USDT"));
    }
}
