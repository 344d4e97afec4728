//! PriceBar: one OHLCV observation for a symbol.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::market::Market;

/// Daily OHLCV bar tagged with its symbol and market.
///
/// Bars are created by an ingestor once per fetch cycle and never mutated
/// after they are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub market: Market,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Why a bar (or a symbol's bar series) was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("empty symbol")]
    EmptySymbol,

    #[error("{symbol} @ {timestamp}: close must be positive and finite, got {close}")]
    NonPositiveClose {
        symbol: String,
        timestamp: NaiveDateTime,
        close: f64,
    },

    #[error("{symbol} @ {timestamp}: volume must be finite and non-negative, got {volume}")]
    InvalidVolume {
        symbol: String,
        timestamp: NaiveDateTime,
        volume: f64,
    },

    #[error("{symbol}: timestamps not strictly increasing at {timestamp}")]
    OutOfOrder {
        symbol: String,
        timestamp: NaiveDateTime,
    },
}

impl PriceBar {
    /// Check the per-bar invariants: non-empty symbol, positive finite close,
    /// non-negative volume.
    pub fn validate(&self) -> Result<(), BarError> {
        if self.symbol.trim().is_empty() {
            return Err(BarError::EmptySymbol);
        }
        if !self.close.is_finite() || self.close <= 0.0 {
            return Err(BarError::NonPositiveClose {
                symbol: self.symbol.clone(),
                timestamp: self.timestamp,
                close: self.close,
            });
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(BarError::InvalidVolume {
                symbol: self.symbol.clone(),
                timestamp: self.timestamp,
                volume: self.volume,
            });
        }
        Ok(())
    }
}

/// Verify that timestamps are strictly increasing within each symbol group.
///
/// Groups may be interleaved; only the order within a symbol matters.
pub fn check_symbol_order(bars: &[PriceBar]) -> Result<(), BarError> {
    let mut last: std::collections::HashMap<&str, NaiveDateTime> = std::collections::HashMap::new();
    for bar in bars {
        if let Some(prev) = last.get(bar.symbol.as_str()) {
            if bar.timestamp <= *prev {
                return Err(BarError::OutOfOrder {
                    symbol: bar.symbol.clone(),
                    timestamp: bar.timestamp,
                });
            }
        }
        last.insert(bar.symbol.as_str(), bar.timestamp);
    }
    Ok(())
}
