//! Application configuration.
//!
//! A single TOML document shared by the CLI and the dashboard. Every field has
//! a default, so an empty file (or no file at all) yields a working setup.
//! Secrets never live here: they come from the environment via [`Credentials`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::{ApiKey, MarketUniverse, RetryPolicy};
use crate::domain::Market;
use crate::indicators::IndicatorWindows;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "ALPHAWAVE_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the shared market files.
    pub data_dir: PathBuf,
    pub equity: EquityConfig,
    pub crypto: CryptoConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquityConfig {
    /// Trailing window fetched per symbol, in calendar days.
    pub lookback_days: u32,
    pub domestic: MarketUniverse,
    pub foreign: MarketUniverse,
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    pub universe: MarketUniverse,
    /// Bar granularity passed to the exchange (e.g. `1d`).
    pub granularity: String,
    /// Bars requested per pair.
    pub limit: u32,
    /// Seconds between the end of one cycle and the start of the next.
    pub interval_secs: u64,
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub windows: IndicatorWindows,
    pub histogram_bins: usize,
    /// Points on the fitted normal curve.
    pub density_points: usize,
    /// Static report offered for download.
    pub report_path: PathBuf,
    /// Name given to the downloaded copy.
    pub report_download_name: String,
    /// Where downloads go; the user's download directory when unset.
    pub download_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            equity: EquityConfig::default(),
            crypto: CryptoConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }
}

impl Default for EquityConfig {
    fn default() -> Self {
        Self {
            lookback_days: 730,
            domestic: MarketUniverse::default_domestic(),
            foreign: MarketUniverse::default_foreign(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            universe: MarketUniverse::default_crypto(),
            granularity: "1d".into(),
            limit: 500,
            interval_secs: 86_400,
            retry: RetryPolicy::default(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            windows: IndicatorWindows::default(),
            histogram_bins: 40,
            density_points: 100,
            report_path: PathBuf::from("relatorio_completo.pdf"),
            report_download_name: "relatorio_completo.pdf".into(),
            download_dir: None,
        }
    }
}

impl AppConfig {
    /// Load from `path`, else from `$ALPHAWAVE_CONFIG`, else defaults.
    ///
    /// A path that was asked for but cannot be read is an error; the absence of
    /// any config is not.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match path.map(Path::to_path_buf).or(env_path) {
            Some(p) => Self::from_file(&p),
            None => {
                tracing::debug!("no config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Universe for a market.
    pub fn universe(&self, market: Market) -> &MarketUniverse {
        match market {
            Market::DomesticEquity => &self.equity.domestic,
            Market::ForeignEquity => &self.equity.foreign,
            Market::Crypto => &self.crypto.universe,
        }
    }

    /// Path of a market's shared file.
    pub fn market_file(&self, market: Market) -> PathBuf {
        self.universe(market).path_in(&self.data_dir)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.equity.lookback_days == 0 {
            return invalid("equity.lookback_days must be positive".into());
        }
        if self.crypto.interval_secs == 0 {
            return invalid("crypto.interval_secs must be positive".into());
        }
        if !(1..=1000).contains(&self.crypto.limit) {
            return invalid(format!(
                "crypto.limit must be between 1 and 1000, got {}",
                self.crypto.limit
            ));
        }
        if self.crypto.granularity.trim().is_empty() {
            return invalid("crypto.granularity must not be empty".into());
        }

        let mut files: Vec<&str> = Vec::new();
        for market in Market::ALL {
            let u = self.universe(market);
            if u.market != market {
                return invalid(format!(
                    "universe '{}' is declared as {} but configured for {market}",
                    u.name, u.market
                ));
            }
            if u.distinct_symbols().is_empty() {
                return invalid(format!("{market} universe has no symbols"));
            }
            if u.file.trim().is_empty() {
                return invalid(format!("{market} universe has no output file"));
            }
            if files.contains(&u.file.as_str()) {
                return invalid(format!("output file '{}' is used by two markets", u.file));
            }
            files.push(&u.file);
            if market.is_equity() && u.label.trim().is_empty() {
                return invalid(format!("{market} universe needs a mercado label"));
            }
        }

        let w = &self.dashboard.windows;
        if w.ma_short == 0 || w.ma_long == 0 || w.macd_fast == 0 || w.macd_slow == 0 || w.macd_signal == 0 {
            return invalid("indicator windows must be positive".into());
        }
        if w.macd_fast >= w.macd_slow {
            return invalid("dashboard.windows.macd_fast must be shorter than macd_slow".into());
        }
        if self.dashboard.histogram_bins == 0 || self.dashboard.density_points < 2 {
            return invalid("histogram_bins must be positive and density_points at least 2".into());
        }
        Ok(())
    }
}

/// Secrets supplied by the environment, read once at process start.
///
/// Every field has a redacting `Debug`, so the struct is safe to log.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub binance_api_key: Option<ApiKey>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            binance_api_key: ApiKey::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.crypto.granularity, "1d");
        assert_eq!(cfg.equity.lookback_days, 730);
        assert_eq!(
            cfg.market_file(Market::Crypto),
            PathBuf::from("data").join("dadospg_cripto.csv")
        );
    }

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_document_overrides_fields() {
        let cfg = AppConfig::from_toml(
            r#"
            data_dir = "/srv/market"

            [crypto]
            interval_secs = 600

            [crypto.universe]
            market = "crypto"
            name = "Crypto"
            label = ""
            file = "crypto.csv"
            symbols = ["BTC/USDT"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.crypto.interval_secs, 600);
        assert_eq!(cfg.crypto.limit, 500);
        assert_eq!(cfg.crypto.universe.symbols, vec!["BTC/USDT"]);
        assert_eq!(cfg.market_file(Market::Crypto), PathBuf::from("/srv/market/crypto.csv"));
    }

    #[test]
    fn rejects_zero_interval() {
        let err = AppConfig::from_toml("[crypto]\ninterval_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_shared_output_file() {
        let mut cfg = AppConfig::default();
        cfg.equity.foreign.file = cfg.equity.domestic.file.clone();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn toml_round_trip() {
        let cfg = AppConfig::default();
        let text = cfg.to_toml().unwrap();
        assert_eq!(AppConfig::from_toml(&text).unwrap(), cfg);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn credentials_debug_hides_key() {
        let creds = Credentials {
            binance_api_key: ApiKey::new("abc123secret"),
        };
        assert!(!format!("{creds:?}").contains("abc123secret"));
    }
}
