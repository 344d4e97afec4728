//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (span + 1).
//! Seed: EMA[0] = x[0], no bias adjustment.
//! Lookback: 0.

use super::{closes, Indicator};
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    name: String,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Self {
            span,
            name: format!("ema_{span}"),
        }
    }

    pub fn span(&self) -> usize {
        self.span
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        ema_of_series(&closes(bars), self.span)
    }
}

/// EMA of an arbitrary series. Used directly by MACD for the signal line.
///
/// A NaN input taints every later value.
pub fn ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n == 0 || span == 0 {
        return result;
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev = values[0];
    result[0] = prev;

    for i in 1..n {
        if prev.is_nan() || values[i].is_nan() {
            return result;
        }
        let ema = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = ema;
        prev = ema;
    }

    result
}
