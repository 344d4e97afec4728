//! Yahoo Finance equity provider.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API. One HTTP request per
//! `fetch`; retries are the caller's job (see `RetryPolicy`) so that the
//! ingestors decide the backoff clock. The circuit breaker is shared across
//! requests.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    base_url: String,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        Self::with_base_url(circuit_breaker, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        circuit_breaker: Arc<CircuitBreaker>,
        base_url: impl Into<String>,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end
            .succ_opt()
            .unwrap_or(end)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();
        format!(
            "{}/v8/finance/chart/{symbol}?period1={start_ts}&period2={end_ts}&interval=1d",
            self.base_url
        )
    }

    /// Parse the chart API response into raw bars.
    ///
    /// Rows where every OHLCV field is null (holidays) are skipped. Rows with a
    /// missing close are kept as NaN and rejected later by bar validation.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<RawBar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let timestamps = data
            .timestamp
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let timestamp = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            bars.push(RawBar {
                timestamp,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(0.0),
            });
        }

        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        Ok(bars)
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        if !self.circuit_breaker.is_allowed() {
            tracing::warn!(
                symbol,
                cooldown_secs = self.circuit_breaker.remaining_cooldown().as_secs(),
                "request refused while the circuit breaker is open"
            );
            return Err(DataError::CircuitBreakerTripped);
        }

        let url = self.chart_url(symbol, start, end);
        tracing::debug!(symbol, %url, "requesting chart");

        let resp = self.client.get(&url).send().map_err(|e| {
            self.circuit_breaker.record_failure();
            DataError::NetworkUnreachable(e.to_string())
        })?;

        let status = resp.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            self.circuit_breaker.trip();
            return Err(DataError::CircuitBreakerTripped);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            self.circuit_breaker.record_failure();
            let retry_after_secs = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(DataError::RateLimited { retry_after_secs });
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(DataError::AuthenticationRequired(
                "Yahoo Finance requires authentication".into(),
            ));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            self.circuit_breaker.record_failure();
            return Err(DataError::Other(format!("HTTP {status} for {symbol}")));
        }

        let chart: ChartResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;
        let bars = Self::parse_response(symbol, chart)?;
        self.circuit_breaker.record_success();

        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::YahooFinance,
        })
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<RawBar>, DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response("VALE3.SA", resp)
    }

    #[test]
    fn parses_quotes_and_skips_empty_rows() {
        let json = r#"{"chart":{"result":[{"timestamp":[1704186000,1704272400,1704358800],
            "indicators":{"quote":[{"open":[10.0,null,11.0],"high":[10.5,null,11.5],
            "low":[9.5,null,10.8],"close":[10.2,null,11.2],"volume":[1000,null,1500]}]}}],
            "error":null}}"#;
        let bars = parse(json).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 10.2);
        assert_eq!(bars[1].volume, 1500.0);
        assert!(bars[0].timestamp < bars[1].timestamp);
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(matches!(parse(json), Err(DataError::SymbolNotFound { .. })));
    }

    #[test]
    fn other_error_maps_to_format_changed() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"invalid range"}}}"#;
        assert!(matches!(parse(json), Err(DataError::ResponseFormatChanged(_))));
    }

    #[test]
    fn missing_close_becomes_nan() {
        let json = r#"{"chart":{"result":[{"timestamp":[1704186000],
            "indicators":{"quote":[{"open":[10.0],"high":[10.5],"low":[9.5],"close":[null],"volume":[1000]}]}}],
            "error":null}}"#;
        let bars = parse(json).unwrap();
        assert!(bars[0].close.is_nan());
    }

    #[test]
    fn chart_url_spans_whole_end_day() {
        let cb = Arc::new(CircuitBreaker::default_provider());
        let provider = YahooProvider::with_base_url(cb, "http://localhost:1/").unwrap();
        let url = provider.chart_url(
            "AAPL",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        );
        assert_eq!(
            url,
            "http://localhost:1/v8/finance/chart/AAPL?period1=1704067200&period2=1704240000&interval=1d"
        );
    }
}
