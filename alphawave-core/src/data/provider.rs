//! Data provider traits and structured error types.
//!
//! `DataProvider` abstracts the equity market-data source (symbol + date window)
//! and `ExchangeProvider` the crypto exchange (pair + granularity), so the
//! ingestors can be driven by fakes in tests.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Market, PriceBar};

/// Raw OHLCV bar from a provider, before validation and tagging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl RawBar {
    /// Stamp the raw bar with its symbol and market.
    pub fn into_price_bar(self, symbol: &str, market: Market) -> PriceBar {
        PriceBar {
            timestamp: self.timestamp,
            symbol: symbol.to_string(),
            market,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

/// Structured error types for data operations.
///
/// These are designed to be displayable in both CLI and TUI contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DataError::NetworkUnreachable(_) | DataError::RateLimited { .. } | DataError::Other(_)
        )
    }
}

/// Result of a successful data fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<RawBar>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    Binance,
    Fixture,
}

/// Equity market-data source: daily bars for a symbol over a date range.
///
/// Implementations handle rate limiting and retries internally where the
/// provider protocol calls for it.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for a symbol over a date range.
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}

/// Crypto exchange source: OHLCV bars for a trading pair at a granularity.
pub trait ExchangeProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch up to `limit` most recent bars for `pair` (e.g. `BTC/USDT`) at
    /// `granularity` (e.g. `1d`).
    fn fetch_ohlcv(
        &self,
        pair: &str,
        granularity: &str,
        limit: u32,
    ) -> Result<FetchResult, DataError>;
}

/// Progress callback for multi-symbol operations.
pub trait DownloadProgress: Send {
    /// Called when starting to fetch a symbol.
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called when a symbol fetch completes.
    fn on_complete(&self, symbol: &str, index: usize, total: usize, result: &Result<(), DataError>);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl DownloadProgress for StdoutProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching {symbol}...", index + 1, total);
    }

    fn on_complete(
        &self,
        symbol: &str,
        _index: usize,
        _total: usize,
        result: &Result<(), DataError>,
    ) {
        match result {
            Ok(()) => println!("  OK: {symbol}"),
            Err(e) => println!("  FAIL: {symbol}: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nBatch complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}

/// Progress reporter that discards all events.
pub struct SilentProgress;

impl DownloadProgress for SilentProgress {
    fn on_start(&self, _symbol: &str, _index: usize, _total: usize) {}

    fn on_complete(
        &self,
        _symbol: &str,
        _index: usize,
        _total: usize,
        _result: &Result<(), DataError>,
    ) {
    }

    fn on_batch_complete(&self, _succeeded: usize, _failed: usize, _total: usize) {}
}
