//! MACD (Moving Average Convergence/Divergence).
//!
//! Line: EMA(close, fast) - EMA(close, slow). Signal: EMA(line, signal).
//! Both EMAs are seeded with the first observation, so there is no warmup.
//! Exposed as separate instances per line, like other multi-series indicators.

use super::ema::ema_of_series;
use super::{closes, Indicator};
use crate::domain::PriceBar;

/// Which MACD output a [`Macd`] instance produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Line,
    Signal,
    Histogram,
}

/// All three MACD outputs, each the length of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdLines {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    output: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, output: MacdLine) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD spans must be >= 1");
        assert!(fast < slow, "MACD fast span must be shorter than slow span");
        let suffix = match output {
            MacdLine::Line => "line",
            MacdLine::Signal => "signal",
            MacdLine::Histogram => "hist",
        };
        Self {
            fast,
            slow,
            signal,
            output,
            name: format!("macd_{fast}_{slow}_{signal}_{suffix}"),
        }
    }

    /// The conventional 12/26/9 configuration.
    pub fn standard(output: MacdLine) -> Self {
        Self::new(12, 26, 9, output)
    }

    /// Compute line, signal and histogram over a close series in one pass.
    pub fn lines_of_series(values: &[f64], fast: usize, slow: usize, signal: usize) -> MacdLines {
        let ema_fast = ema_of_series(values, fast);
        let ema_slow = ema_of_series(values, slow);
        let line: Vec<f64> = ema_fast
            .iter()
            .zip(&ema_slow)
            .map(|(f, s)| f - s)
            .collect();
        let signal = ema_of_series(&line, signal);
        let histogram = line.iter().zip(&signal).map(|(l, s)| l - s).collect();
        MacdLines {
            line,
            signal,
            histogram,
        }
    }

    pub fn lines(&self, bars: &[PriceBar]) -> MacdLines {
        Self::lines_of_series(&closes(bars), self.fast, self.slow, self.signal)
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let lines = self.lines(bars);
        match self.output {
            MacdLine::Line => lines.line,
            MacdLine::Signal => lines.signal,
            MacdLine::Histogram => lines.histogram,
        }
    }
}
