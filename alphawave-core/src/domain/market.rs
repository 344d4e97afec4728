//! Market: which universe a bar belongs to.

use serde::{Deserialize, Serialize};

/// The three markets the pipeline knows about.
///
/// Each market maps to exactly one shared file. Equity markets carry a
/// `mercado` column in that file; the crypto file does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    DomesticEquity,
    ForeignEquity,
    Crypto,
}

impl Market {
    pub const ALL: [Market; 3] = [Market::Crypto, Market::DomesticEquity, Market::ForeignEquity];

    /// Whether files for this market carry the `mercado` column.
    pub fn has_market_column(self) -> bool {
        !matches!(self, Market::Crypto)
    }

    pub fn is_equity(self) -> bool {
        self.has_market_column()
    }

    /// Stable machine name, used in CLI arguments and persisted state.
    pub fn key(self) -> &'static str {
        match self {
            Market::DomesticEquity => "domestic",
            Market::ForeignEquity => "foreign",
            Market::Crypto => "crypto",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "domestic" | "brasil" | "br" => Some(Market::DomesticEquity),
            "foreign" | "eua" | "usa" | "us" => Some(Market::ForeignEquity),
            "crypto" | "cripto" => Some(Market::Crypto),
            _ => None,
        }
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
