//! AlphaWave Core: market data types, providers, the shared file contract,
//! indicators and statistics.
//!
//! This crate contains everything the ingestors and the dashboard agree on:
//! - Domain types (price bars, markets)
//! - Provider traits with Yahoo Finance and Binance implementations
//! - Retry policy and circuit breaker for provider calls
//! - Versioned CSV table schema with atomic writes and validated reads
//! - Indicators (SMA, EMA, MACD, returns) and descriptive statistics
//! - TOML configuration and environment-supplied credentials

pub mod config;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod stats;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types handed to the dashboard worker thread are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceBar>();
        require_sync::<domain::PriceBar>();
        require_send::<domain::Market>();
        require_sync::<domain::Market>();

        require_send::<data::TableMeta>();
        require_sync::<data::TableMeta>();
        require_send::<data::TableError>();
        require_sync::<data::TableError>();
        require_send::<data::DataError>();
        require_sync::<data::DataError>();
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::BinanceProvider>();
        require_sync::<data::BinanceProvider>();

        require_send::<indicators::DerivedSeries>();
        require_sync::<indicators::DerivedSeries>();
        require_send::<config::AppConfig>();
        require_sync::<config::AppConfig>();
    }

    /// Providers are usable as trait objects so ingestors can take fakes.
    #[test]
    fn provider_traits_are_object_safe() {
        fn _equity(_p: &dyn data::DataProvider) {}
        fn _exchange(_p: &dyn data::ExchangeProvider) {}
        fn _indicator(_i: &dyn indicators::Indicator) {}
    }
}
