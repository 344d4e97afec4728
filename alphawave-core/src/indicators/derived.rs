//! Per-symbol derived series for the dashboard.
//!
//! Computed from one symbol's bars (ascending) for a single view and thrown
//! away on the next load; never persisted.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::macd::{Macd, MacdLines};
use super::returns::simple_returns;
use super::sma::sma_of_series;
use crate::domain::PriceBar;

/// Window lengths used by the analysis panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorWindows {
    pub ma_short: usize,
    pub ma_long: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorWindows {
    fn default() -> Self {
        Self {
            ma_short: 50,
            ma_long: 200,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSeries {
    pub symbol: String,
    pub timestamps: Vec<NaiveDateTime>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
    /// Length `close.len() - 1`; `returns[i]` belongs to `timestamps[i + 1]`.
    pub returns: Vec<f64>,
    pub ma_short: Vec<f64>,
    pub ma_long: Vec<f64>,
    pub macd: MacdLines,
}

impl DerivedSeries {
    pub fn compute(symbol: &str, bars: &[PriceBar], windows: &IndicatorWindows) -> Self {
        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
        Self {
            symbol: symbol.to_string(),
            timestamps: bars.iter().map(|b| b.timestamp).collect(),
            volume: bars.iter().map(|b| b.volume).collect(),
            returns: simple_returns(&close),
            ma_short: sma_of_series(&close, windows.ma_short),
            ma_long: sma_of_series(&close, windows.ma_long),
            macd: Macd::lines_of_series(
                &close,
                windows.macd_fast,
                windows.macd_slow,
                windows.macd_signal,
            ),
            close,
        }
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn lengths_line_up() {
        let closes: Vec<f64> = (1..=60).map(|i| i as f64).collect();
        let bars = make_bars(&closes);
        let d = DerivedSeries::compute("TEST", &bars, &IndicatorWindows::default());
        assert_eq!(d.len(), 60);
        assert_eq!(d.returns.len(), 59);
        assert_eq!(d.ma_short.len(), 60);
        assert!(d.ma_short[48].is_nan());
        assert_eq!(d.ma_short[49], 25.5);
        assert!(d.ma_long.iter().all(|v| v.is_nan()));
        assert_eq!(d.macd.line.len(), 60);
    }

    #[test]
    fn single_bar_has_no_returns() {
        let d = DerivedSeries::compute("X", &make_bars(&[10.0]), &IndicatorWindows::default());
        assert!(d.returns.is_empty());
        assert!(!d.is_empty());
    }
}
