//! Technical indicators over a single symbol's bar series.
//!
//! Every indicator implements [`Indicator`]: a full bar series in, a numeric
//! series of the same length out, with `f64::NAN` during warmup. Callers must
//! pass bars for one symbol, ascending by timestamp.
//!
//! Multi-series indicators (MACD) are exposed as separate named instances per
//! line, keeping the single-series trait unchanged.

pub mod derived;
pub mod ema;
pub mod macd;
pub mod returns;
pub mod sma;

pub use derived::{DerivedSeries, IndicatorWindows};
pub use ema::{ema_of_series, Ema};
pub use macd::{Macd, MacdLine, MacdLines};
pub use returns::simple_returns;
pub use sma::{sma_of_series, Sma};

use crate::domain::PriceBar;

/// Trait for indicators.
///
/// # Look-ahead guard
/// No value at index t may depend on a bar after t. Every indicator must give
/// the same prefix on a truncated series as on the full one.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_50", "macd_signal").
    fn name(&self) -> &str;

    /// Number of leading values that are `f64::NAN`.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire series. Output length equals `bars.len()`.
    fn compute(&self, bars: &[PriceBar]) -> Vec<f64>;
}

pub(crate) fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev close (or close for the first bar), high/low one unit either
/// side, volume 1000, one bar per day from 2024-01-02.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    use crate::domain::Market;
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                timestamp: base + chrono::Duration::days(i as i64),
                symbol: "TEST".to_string(),
                market: Market::Crypto,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
