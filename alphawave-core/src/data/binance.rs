//! Binance public klines provider for crypto pairs.
//!
//! `GET /api/v3/klines?symbol=BTCUSDT&interval=1d&limit=500`. Each kline is a
//! JSON array `[open_time_ms, "open", "high", "low", "close", "volume", ...]`.
//! Market data is public; an API key is attached as `X-MBX-APIKEY` only when
//! one is supplied through the environment.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataSource, ExchangeProvider, FetchResult, RawBar};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Environment variable holding the optional exchange API key.
pub const API_KEY_ENV: &str = "ALPHAWAVE_BINANCE_API_KEY";

/// Exchange API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Read the key from `ALPHAWAVE_BINANCE_API_KEY`, if set and non-empty.
    pub fn from_env() -> Option<Self> {
        std::env::var(API_KEY_ENV).ok().and_then(Self::new)
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

/// Invalid symbol error code in Binance error bodies.
const INVALID_SYMBOL: i64 = -1121;

/// Map a `BASE/QUOTE` pair to the exchange symbol (`BTC/USDT` -> `BTCUSDT`).
pub fn exchange_symbol(pair: &str) -> Result<String, DataError> {
    let mut parts = pair.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(base), Some(quote), None) if !base.trim().is_empty() && !quote.trim().is_empty() => {
            Ok(format!(
                "{}{}",
                base.trim().to_ascii_uppercase(),
                quote.trim().to_ascii_uppercase()
            ))
        }
        _ => Err(DataError::InvalidRequest(format!(
            "pair must look like BASE/QUOTE, got '{pair}'"
        ))),
    }
}

pub struct BinanceProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    base_url: String,
    api_key: Option<ApiKey>,
}

impl BinanceProvider {
    pub fn new(
        circuit_breaker: Arc<CircuitBreaker>,
        api_key: Option<ApiKey>,
    ) -> Result<Self, DataError> {
        Self::with_base_url(circuit_breaker, api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        circuit_breaker: Arc<CircuitBreaker>,
        api_key: Option<ApiKey>,
        base_url: impl Into<String>,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn klines_url(&self, symbol: &str, granularity: &str, limit: u32) -> String {
        format!(
            "{}/api/v3/klines?symbol={symbol}&interval={granularity}&limit={limit}",
            self.base_url
        )
    }

    /// Parse a klines payload into raw bars, oldest first.
    fn parse_klines(pair: &str, rows: Vec<Vec<serde_json::Value>>) -> Result<Vec<RawBar>, DataError> {
        let mut bars = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if row.len() < 6 {
                return Err(DataError::ResponseFormatChanged(format!(
                    "{pair}: kline {i} has {} fields, expected at least 6",
                    row.len()
                )));
            }
            let open_ms = row[0].as_i64().ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("{pair}: kline {i} open time is not an integer"))
            })?;
            let timestamp = chrono::DateTime::from_timestamp_millis(open_ms)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("{pair}: invalid open time {open_ms}"))
                })?;

            bars.push(RawBar {
                timestamp,
                open: number_field(pair, i, &row[1])?,
                high: number_field(pair, i, &row[2])?,
                low: number_field(pair, i, &row[3])?,
                close: number_field(pair, i, &row[4])?,
                volume: number_field(pair, i, &row[5])?,
            });
        }
        Ok(bars)
    }
}

/// Kline prices arrive as decimal strings; accept bare numbers as well.
fn number_field(pair: &str, row: usize, value: &serde_json::Value) -> Result<f64, DataError> {
    match value {
        serde_json::Value::String(s) => s.parse::<f64>().map_err(|e| {
            DataError::ResponseFormatChanged(format!("{pair}: kline {row} value '{s}': {e}"))
        }),
        serde_json::Value::Number(n) => n.as_f64().ok_or_else(|| {
            DataError::ResponseFormatChanged(format!("{pair}: kline {row} value {n} out of range"))
        }),
        other => Err(DataError::ResponseFormatChanged(format!(
            "{pair}: kline {row} unexpected value {other}"
        ))),
    }
}

impl ExchangeProvider for BinanceProvider {
    fn name(&self) -> &str {
        "binance"
    }

    fn fetch_ohlcv(
        &self,
        pair: &str,
        granularity: &str,
        limit: u32,
    ) -> Result<FetchResult, DataError> {
        let symbol = exchange_symbol(pair)?;
        if !self.circuit_breaker.is_allowed() {
            tracing::warn!(
                pair,
                cooldown_secs = self.circuit_breaker.remaining_cooldown().as_secs(),
                "request refused while the circuit breaker is open"
            );
            return Err(DataError::CircuitBreakerTripped);
        }

        let url = self.klines_url(&symbol, granularity, limit);
        tracing::debug!(pair, %url, authenticated = self.api_key.is_some(), "requesting klines");

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("X-MBX-APIKEY", key.expose());
        }
        let resp = request.send().map_err(|e| {
            self.circuit_breaker.record_failure();
            DataError::NetworkUnreachable(e.to_string())
        })?;

        let status = resp.status();
        // 418 is Binance's IP ban after ignoring 429s.
        if status.as_u16() == 418 || status == reqwest::StatusCode::FORBIDDEN {
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
                "exchange rejected the API key".into(),
            ));
        }
        if status.is_client_error() {
            let body: Option<ApiErrorBody> = resp.json().ok();
            return Err(match body {
                Some(b) if b.code == INVALID_SYMBOL => DataError::SymbolNotFound {
                    symbol: pair.to_string(),
                },
                Some(b) => DataError::InvalidRequest(format!("{pair}: {} ({})", b.msg, b.code)),
                None => DataError::InvalidRequest(format!("HTTP {status} for {pair}")),
            });
        }
        if !status.is_success() {
            self.circuit_breaker.record_failure();
            return Err(DataError::Other(format!("HTTP {status} for {pair}")));
        }

        let rows: Vec<Vec<serde_json::Value>> = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse klines for {pair}: {e}"))
        })?;
        let bars = Self::parse_klines(pair, rows)?;
        self.circuit_breaker.record_success();

        Ok(FetchResult {
            symbol: pair.to_string(),
            bars,
            source: DataSource::Binance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_maps_to_exchange_symbol() {
        assert_eq!(exchange_symbol("BTC/USDT").unwrap(), "BTCUSDT");
        assert_eq!(exchange_symbol("shib/usdt").unwrap(), "SHIBUSDT");
        assert!(exchange_symbol("BTCUSDT").is_err());
        assert!(exchange_symbol("BTC/").is_err());
        assert!(exchange_symbol("A/B/C").is_err());
    }

    #[test]
    fn parses_string_encoded_klines() {
        let json = r#"[
            [1704067200000,"42283.58","44184.10","42180.77","44179.55","27174.29903",1704153599999,"1169995682.6",1,"1","1","0"],
            [1704153600000,"44179.55","45879.63","44148.34","44946.91","65146.40661",1704239999999,"2957869676.6",1,"1","1","0"]
        ]"#;
        let rows: Vec<Vec<serde_json::Value>> = serde_json::from_str(json).unwrap();
        let bars = BinanceProvider::parse_klines("BTC/USDT", rows).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp.to_string(), "2024-01-01 00:00:00");
        assert_eq!(bars[0].close, 44179.55);
        assert_eq!(bars[1].volume, 65146.40661);
    }

    #[test]
    fn short_kline_is_a_format_change() {
        let rows: Vec<Vec<serde_json::Value>> =
            serde_json::from_str(r#"[[1704067200000,"1.0","2.0"]]"#).unwrap();
        assert!(matches!(
            BinanceProvider::parse_klines("BTC/USDT", rows),
            Err(DataError::ResponseFormatChanged(_))
        ));
    }

    #[test]
    fn non_numeric_price_is_a_format_change() {
        let rows: Vec<Vec<serde_json::Value>> = serde_json::from_str(
            r#"[[1704067200000,"abc","2.0","0.5","1.5","10"]]"#,
        )
        .unwrap();
        assert!(BinanceProvider::parse_klines("BTC/USDT", rows).is_err());
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("super-secret-value").unwrap();
        let shown = format!("{key:?}");
        assert!(!shown.contains("super-secret-value"));
        assert!(ApiKey::new("   ").is_none());
    }

    #[test]
    fn klines_url_uses_exchange_symbol() {
        let cb = Arc::new(CircuitBreaker::default_provider());
        let provider = BinanceProvider::with_base_url(cb, None, "http://localhost:1").unwrap();
        assert_eq!(
            provider.klines_url("ETHUSDT", "1d", 500),
            "http://localhost:1/api/v3/klines?symbol=ETHUSDT&interval=1d&limit=500"
        );
    }
}
