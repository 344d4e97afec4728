//! Dashboard-side loading of the shared market files.
//!
//! A [`MarketLoader`] memoizes one parsed table per market for the session.
//! Loading validates the file against the schema, groups bars by symbol in
//! order of first appearance, and sorts each group by timestamp. An explicit
//! reload drops the memo for that market only.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDateTime;
use thiserror::Error;

use alphawave_core::config::AppConfig;
use alphawave_core::data::{read_meta, read_table, TableError, TableMeta};
use alphawave_core::domain::{Market, PriceBar};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data file for {market} at {}; run the ingestor first", path.display())]
    Missing { market: Market, path: PathBuf },

    #[error("{market} file {} is malformed: {source}", path.display())]
    Malformed {
        market: Market,
        path: PathBuf,
        #[source]
        source: TableError,
    },

    #[error("{market} file {} has no valid rows", path.display())]
    NoValidRows { market: Market, path: PathBuf },
}

/// One symbol's bars, ascending by timestamp with no repeated timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSeries {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
}

impl SymbolSeries {
    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.bars.first().map(|b| b.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.bars.last().map(|b| b.timestamp)
    }
}

/// A validated market table, grouped by symbol.
#[derive(Debug, Clone)]
pub struct MarketData {
    pub market: Market,
    pub path: PathBuf,
    pub series: Vec<SymbolSeries>,
    /// Rows dropped for violating bar invariants.
    pub rejected_rows: usize,
    /// Repeated (symbol, timestamp) rows dropped while grouping.
    pub duplicate_rows: usize,
    pub meta: Option<TableMeta>,
}

impl MarketData {
    pub fn symbols(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.symbol.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.series.iter().map(|s| s.bars.len()).sum()
    }

    pub fn get(&self, symbol: &str) -> Option<&SymbolSeries> {
        self.series.iter().find(|s| s.symbol == symbol)
    }
}

/// Group bars by symbol (first-appearance order), sort and dedup each group.
pub fn group_by_symbol(bars: Vec<PriceBar>) -> (Vec<SymbolSeries>, usize) {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<PriceBar>> = HashMap::new();
    for bar in bars {
        if !groups.contains_key(&bar.symbol) {
            order.push(bar.symbol.clone());
        }
        groups.entry(bar.symbol.clone()).or_default().push(bar);
    }

    let mut duplicates = 0;
    let series = order
        .into_iter()
        .map(|symbol| {
            let mut bars = groups.remove(&symbol).unwrap_or_default();
            bars.sort_by_key(|b| b.timestamp);
            let before = bars.len();
            bars.dedup_by_key(|b| b.timestamp);
            duplicates += before - bars.len();
            SymbolSeries { symbol, bars }
        })
        .collect();
    (series, duplicates)
}

/// Read, validate and group one market file.
pub fn load_market(market: Market, path: &Path) -> Result<MarketData, LoadError> {
    let read = read_table(path, market).map_err(|source| match source {
        TableError::NotFound { path } => LoadError::Missing { market, path },
        source => LoadError::Malformed {
            market,
            path: path.to_path_buf(),
            source,
        },
    })?;

    if read.bars.is_empty() {
        return Err(LoadError::NoValidRows {
            market,
            path: path.to_path_buf(),
        });
    }

    let (series, duplicate_rows) = group_by_symbol(read.bars);
    tracing::info!(
        %market,
        path = %path.display(),
        symbols = series.len(),
        rejected = read.rejected_rows,
        duplicates = duplicate_rows,
        "market data loaded"
    );

    Ok(MarketData {
        market,
        path: path.to_path_buf(),
        series,
        rejected_rows: read.rejected_rows,
        duplicate_rows,
        meta: read_meta(path),
    })
}

/// Per-session memo of loaded markets.
#[derive(Debug)]
pub struct MarketLoader {
    paths: HashMap<Market, PathBuf>,
    memo: HashMap<Market, Arc<MarketData>>,
}

impl MarketLoader {
    pub fn new(paths: HashMap<Market, PathBuf>) -> Self {
        Self {
            paths,
            memo: HashMap::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Market::ALL
                .iter()
                .map(|&m| (m, config.market_file(m)))
                .collect(),
        )
    }

    pub fn path(&self, market: Market) -> Option<&Path> {
        self.paths.get(&market).map(PathBuf::as_path)
    }

    pub fn is_cached(&self, market: Market) -> bool {
        self.memo.contains_key(&market)
    }

    /// Memoized load. Failures are not cached, so the next call retries.
    pub fn load(&mut self, market: Market) -> Result<Arc<MarketData>, LoadError> {
        if let Some(data) = self.memo.get(&market) {
            return Ok(Arc::clone(data));
        }
        let path = self
            .paths
            .get(&market)
            .cloned()
            .unwrap_or_else(|| PathBuf::from(format!("{market}.csv")));
        let data = Arc::new(load_market(market, &path)?);
        self.memo.insert(market, Arc::clone(&data));
        Ok(data)
    }

    /// Drop the memo for `market` and load it again.
    pub fn reload(&mut self, market: Market) -> Result<Arc<MarketData>, LoadError> {
        self.invalidate(market);
        self.load(market)
    }

    pub fn invalidate(&mut self, market: Market) {
        if self.memo.remove(&market).is_some() {
            tracing::debug!(%market, "memo cleared");
        }
    }
}
