//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use super::{closes, Indicator};
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        sma_of_series(&closes(bars), self.period)
    }
}

/// Trailing mean over `period` values; NaN before `period - 1` and wherever
/// the window contains a NaN.
pub fn sma_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut nan_count = 0usize;
    for &v in values.iter().take(period) {
        if v.is_nan() {
            nan_count += 1;
        } else {
            sum += v;
        }
    }
    if nan_count == 0 {
        result[period - 1] = sum / period as f64;
    }

    // Roll the window forward, tracking NaNs by count instead of rescanning.
    for i in period..n {
        let leaving = values[i - period];
        let entering = values[i];
        if leaving.is_nan() {
            nan_count -= 1;
        } else {
            sum -= leaving;
        }
        if entering.is_nan() {
            nan_count += 1;
        } else {
            sum += entering;
        }
        if nan_count == 0 {
            result[i] = sum / period as f64;
        }
    }

    result
}
