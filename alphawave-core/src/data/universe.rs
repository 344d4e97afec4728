//! Universe configuration: the symbol lists each ingestor fetches.
//!
//! A universe names a market, the `mercado` label written for it, its output
//! file and its ordered symbol list. Order matters: the writer unions symbol
//! groups in this order.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::Market;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketUniverse {
    pub market: Market,
    /// Display name shown in the dashboard navigation.
    pub name: String,
    /// Value of the `mercado` column (equity files only).
    pub label: String,
    /// Output file name, relative to the data directory.
    pub file: String,
    pub symbols: Vec<String>,
}

fn owned(symbols: &[&str]) -> Vec<String> {
    symbols.iter().map(|s| s.to_string()).collect()
}

impl MarketUniverse {
    pub fn default_domestic() -> Self {
        Self {
            market: Market::DomesticEquity,
            name: "Bolsa Brasileira".into(),
            label: "Brasil".into(),
            file: "dados_brasil.csv".into(),
            symbols: owned(&[
                "VALE3.SA", "PETR4.SA", "ITUB4.SA", "BBDC4.SA", "ABEV3.SA", "MGLU3.SA", "BBAS3.SA",
            ]),
        }
    }

    pub fn default_foreign() -> Self {
        Self {
            market: Market::ForeignEquity,
            name: "Bolsa Americana".into(),
            label: "EUA".into(),
            file: "dados_usa.csv".into(),
            symbols: owned(&["AAPL", "MSFT", "AMZN", "TSLA", "GOOGL", "META", "KO"]),
        }
    }

    pub fn default_crypto() -> Self {
        Self {
            market: Market::Crypto,
            name: "Criptomoedas".into(),
            label: String::new(),
            file: "dadospg_cripto.csv".into(),
            symbols: owned(&[
                "BTC/USDT", "ETH/USDT", "DOGE/USDT", "SOL/USDT", "AAVE/USDT", "SHIB/USDT",
                "ADA/USDT",
            ]),
        }
    }

    pub fn default_for(market: Market) -> Self {
        match market {
            Market::DomesticEquity => Self::default_domestic(),
            Market::ForeignEquity => Self::default_foreign(),
            Market::Crypto => Self::default_crypto(),
        }
    }

    /// Full path of this universe's file under `data_dir`.
    pub fn path_in(&self, data_dir: &Path) -> std::path::PathBuf {
        data_dir.join(&self.file)
    }

    /// Symbols with blanks removed and duplicates dropped, first occurrence kept.
    pub fn distinct_symbols(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.symbols.len());
        for s in &self.symbols {
            let s = s.trim();
            if !s.is_empty() && !seen.contains(&s) {
                seen.push(s);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_markets() {
        for m in Market::ALL {
            let u = MarketUniverse::default_for(m);
            assert_eq!(u.market, m);
            assert_eq!(u.symbols.len(), 7);
        }
        assert_eq!(MarketUniverse::default_domestic().label, "Brasil");
        assert_eq!(MarketUniverse::default_foreign().file, "dados_usa.csv");
    }

    #[test]
    fn distinct_symbols_keeps_first_occurrence() {
        let mut u = MarketUniverse::default_foreign();
        u.symbols = vec!["KO".into(), " ".into(), "AAPL".into(), "KO".into()];
        assert_eq!(u.distinct_symbols(), vec!["KO", "AAPL"]);
    }

    #[test]
    fn universe_round_trips_through_toml() {
        let u = MarketUniverse::default_crypto();
        let text = toml::to_string(&u).unwrap();
        let back: MarketUniverse = toml::from_str(&text).unwrap();
        assert_eq!(back, u);
    }
}
