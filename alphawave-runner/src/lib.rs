//! AlphaWave Runner: ingestion pipelines and dashboard plumbing.
//!
//! This crate builds on `alphawave-core` to provide:
//! - Equity batch ingestion (domestic and foreign universes)
//! - Crypto fetch cycles and the polling scheduler
//! - Memoized loading of the shared market files
//! - Analysis panel descriptions (`ChartSpec`) for the dashboard
//! - Static report download

pub mod analysis;
pub mod clock;
pub mod crypto;
pub mod equity;
pub mod ingest;
pub mod loader;
pub mod report;
pub mod scheduler;

pub use analysis::{AnalysisPanel, AxisKind, ChartSpec, MarketAnalysis, SeriesKind, SeriesSpec};
pub use clock::{Clock, ManualClock, SystemClock};
pub use crypto::CryptoIngestor;
pub use equity::EquityIngestor;
pub use ingest::{normalize_symbol_bars, IngestError, IngestReport, SymbolFailure, SymbolOutcome};
pub use loader::{group_by_symbol, load_market, LoadError, MarketData, MarketLoader, SymbolSeries};
pub use report::{download_report, ReportError};
pub use scheduler::{Scheduler, SchedulerSummary};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn market_data_is_send_sync() {
        assert_send::<MarketData>();
        assert_sync::<MarketData>();
    }

    #[test]
    fn chart_spec_is_send_sync() {
        assert_send::<ChartSpec>();
        assert_sync::<ChartSpec>();
    }

    #[test]
    fn ingest_report_is_send_sync() {
        assert_send::<IngestReport>();
        assert_sync::<IngestReport>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
        assert_send::<IngestError>();
        assert_sync::<IngestError>();
    }
}
