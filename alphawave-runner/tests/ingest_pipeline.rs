//! End-to-end ingestion against in-memory providers.

use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};

use alphawave_core::config::CryptoConfig;
use alphawave_core::data::{
    read_meta, read_table, DataError, DataProvider, DataSource, ExchangeProvider, FetchResult,
    MarketUniverse, RawBar, RetryPolicy, SilentProgress,
};
use alphawave_core::domain::Market;
use alphawave_runner::{
    Clock, CryptoIngestor, EquityIngestor, IngestError, ManualClock, Scheduler,
};

fn raw(day: u32, close: f64) -> RawBar {
    RawBar {
        timestamp: NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1_000.0 * day as f64,
    }
}

fn series(base: f64) -> Vec<RawBar> {
    // deliberately unsorted with one duplicate
    vec![raw(3, base + 3.0), raw(1, base + 1.0), raw(2, base + 2.0), raw(3, base + 9.0)]
}

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap())
}

fn no_jitter(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        base_delay_ms: 100,
        max_delay_ms: 1_000,
        jitter_ms: 0,
    }
}

/// Equity source serving fixed bars; unknown symbols are not found.
struct FakeEquity {
    bars: HashMap<String, Vec<RawBar>>,
    /// Transient failures to return before succeeding, per symbol.
    flaky: Mutex<HashMap<String, u32>>,
    calls: Mutex<Vec<(String, NaiveDate, NaiveDate)>>,
    blocked: AtomicBool,
}

impl FakeEquity {
    fn new(symbols: &[(&str, f64)]) -> Self {
        Self {
            bars: symbols
                .iter()
                .map(|(s, base)| (s.to_string(), series(*base)))
                .collect(),
            flaky: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            blocked: AtomicBool::new(false),
        }
    }

    fn flaky(self, symbol: &str, failures: u32) -> Self {
        self.flaky.lock().unwrap().insert(symbol.into(), failures);
        self
    }
}

impl DataProvider for FakeEquity {
    fn name(&self) -> &str {
        "fake-equity"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<FetchResult, DataError> {
        self.calls.lock().unwrap().push((symbol.into(), start, end));
        if let Some(left) = self.flaky.lock().unwrap().get_mut(symbol) {
            if *left > 0 {
                *left -= 1;
                return Err(DataError::NetworkUnreachable("connection reset".into()));
            }
        }
        match self.bars.get(symbol) {
            Some(bars) => Ok(FetchResult {
                symbol: symbol.into(),
                bars: bars.clone(),
                source: DataSource::Fixture,
            }),
            None => Err(DataError::SymbolNotFound {
                symbol: symbol.into(),
            }),
        }
    }

    fn is_available(&self) -> bool {
        !self.blocked.load(Ordering::SeqCst)
    }
}

struct FakeExchange {
    bars: HashMap<String, Vec<RawBar>>,
    down: bool,
}

impl ExchangeProvider for FakeExchange {
    fn name(&self) -> &str {
        "fake-exchange"
    }

    fn fetch_ohlcv(&self, pair: &str, granularity: &str, limit: u32) -> Result<FetchResult, DataError> {
        assert_eq!(granularity, "1d");
        if self.down {
            return Err(DataError::NetworkUnreachable("exchange offline".into()));
        }
        let bars = self.bars.get(pair).cloned().ok_or_else(|| DataError::SymbolNotFound {
            symbol: pair.into(),
        })?;
        let skip = bars.len().saturating_sub(limit as usize);
        Ok(FetchResult {
            symbol: pair.into(),
            bars: bars.into_iter().skip(skip).collect(),
            source: DataSource::Fixture,
        })
    }
}

fn equity_universe(market: Market, symbols: &[&str]) -> MarketUniverse {
    let mut u = MarketUniverse::default_for(market);
    u.symbols = symbols.iter().map(|s| s.to_string()).collect();
    u
}

fn crypto_config(pairs: &[&str]) -> CryptoConfig {
    let mut config = CryptoConfig::default();
    config.universe.symbols = pairs.iter().map(|s| s.to_string()).collect();
    config.retry = no_jitter(1);
    config
}

#[test]
fn n_symbols_in_n_sorted_groups_out() {
    let dir = tempfile::tempdir().unwrap();
    let provider = FakeEquity::new(&[("AAPL", 100.0), ("MSFT", 200.0), ("KO", 50.0)]);
    let ingestor = EquityIngestor::new(&provider, no_jitter(0), 730, dir.path());
    let universe = equity_universe(Market::ForeignEquity, &["AAPL", "MSFT", "KO"]);

    let report = ingestor
        .run_market(&universe, &mut clock(), &SilentProgress)
        .unwrap();
    assert_eq!(report.succeeded.len(), 3);
    assert!(report.failed.is_empty());
    assert_eq!(report.rows_written(), 9);
    assert!(report.succeeded.iter().all(|s| s.duplicates == 1));

    let read = read_table(&dir.path().join("dados_usa.csv"), Market::ForeignEquity).unwrap();
    let (groups, dups) = alphawave_runner::group_by_symbol(read.bars);
    assert_eq!(dups, 0);
    let names: Vec<&str> = groups.iter().map(|g| g.symbol.as_str()).collect();
    assert_eq!(names, vec!["AAPL", "MSFT", "KO"]);
    for g in &groups {
        assert!(g.bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }
}

#[test]
fn equity_window_ends_at_clock_date() {
    let dir = tempfile::tempdir().unwrap();
    let provider = FakeEquity::new(&[("VALE3.SA", 60.0)]);
    let ingestor = EquityIngestor::new(&provider, no_jitter(0), 730, dir.path());
    let universe = equity_universe(Market::DomesticEquity, &["VALE3.SA"]);
    ingestor
        .run_market(&universe, &mut clock(), &SilentProgress)
        .unwrap();

    let calls = provider.calls.lock().unwrap();
    let (_, start, end) = &calls[0];
    assert_eq!(*end, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    assert_eq!((*end - *start).num_days(), 730);

    let content = fs::read_to_string(dir.path().join("dados_brasil.csv")).unwrap();
    assert!(content.starts_with("tempo,abertura,alto,baixo,fechamento,volume,moeda,mercado\n"));
    assert!(content.lines().skip(1).all(|l| l.ends_with(",VALE3.SA,Brasil")));
}

#[test]
fn failed_symbol_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let provider = FakeEquity::new(&[("AAPL", 100.0), ("KO", 50.0)]);
    let ingestor = EquityIngestor::new(&provider, no_jitter(2), 730, dir.path());
    let universe = equity_universe(Market::ForeignEquity, &["AAPL", "DELISTED", "KO"]);

    let report = ingestor
        .run_market(&universe, &mut clock(), &SilentProgress)
        .unwrap();
    assert!(report.is_partial());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].symbol, "DELISTED");
    assert!(report.failed[0].reason.contains("not found"));
    assert_eq!(report.meta.symbols, vec!["AAPL", "KO"]);
    // permanent errors are not retried
    let calls = provider.calls.lock().unwrap();
    assert_eq!(calls.iter().filter(|c| c.0 == "DELISTED").count(), 1);
}

#[test]
fn transient_failures_back_off_on_the_injected_clock() {
    let dir = tempfile::tempdir().unwrap();
    let provider = FakeEquity::new(&[("AAPL", 100.0)]).flaky("AAPL", 2);
    let ingestor = EquityIngestor::new(&provider, no_jitter(3), 730, dir.path());
    let universe = equity_universe(Market::ForeignEquity, &["AAPL"]);
    let mut clock = clock();

    let report = ingestor
        .run_market(&universe, &mut clock, &SilentProgress)
        .unwrap();
    assert_eq!(report.succeeded.len(), 1);
    assert_eq!(
        clock.sleeps(),
        &[Duration::from_millis(100), Duration::from_millis(200)]
    );
}

#[test]
fn all_symbols_failing_leaves_previous_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let universe = equity_universe(Market::ForeignEquity, &["AAPL"]);

    let good = FakeEquity::new(&[("AAPL", 100.0)]);
    EquityIngestor::new(&good, no_jitter(0), 730, dir.path())
        .run_market(&universe, &mut clock(), &SilentProgress)
        .unwrap();
    let path = dir.path().join("dados_usa.csv");
    let before = fs::read(&path).unwrap();

    let empty = FakeEquity::new(&[]);
    let err = EquityIngestor::new(&empty, no_jitter(0), 730, dir.path())
        .run_market(&universe, &mut clock(), &SilentProgress)
        .unwrap_err();
    match err {
        IngestError::AllSymbolsFailed { market, failures } => {
            assert_eq!(market, Market::ForeignEquity);
            assert_eq!(failures.len(), 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn run_all_reports_each_market_separately() {
    let dir = tempfile::tempdir().unwrap();
    let provider = FakeEquity::new(&[("PETR4.SA", 30.0)]);
    let ingestor = EquityIngestor::new(&provider, no_jitter(0), 730, dir.path());
    let domestic = equity_universe(Market::DomesticEquity, &["PETR4.SA"]);
    let foreign = equity_universe(Market::ForeignEquity, &["AAPL"]);

    let results = ingestor.run_all(&[&domestic, &foreign], &mut clock(), &SilentProgress);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(IngestError::AllSymbolsFailed { .. })));
    assert!(dir.path().join("dados_brasil.csv").exists());
    assert!(!dir.path().join("dados_usa.csv").exists());
}

#[test]
fn two_cycles_over_stable_input_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let exchange = FakeExchange {
        bars: [("BTC/USDT", 40_000.0), ("ETH/USDT", 2_000.0)]
            .into_iter()
            .map(|(p, b)| (p.to_string(), series(b)))
            .collect(),
        down: false,
    };
    let config = crypto_config(&["BTC/USDT", "ETH/USDT"]);
    let ingestor = CryptoIngestor::new(&exchange, &config, dir.path());
    let path = dir.path().join("dadospg_cripto.csv");

    let first = ingestor.run_cycle(&mut clock()).unwrap();
    assert!(!first.unchanged);
    let bytes_a = fs::read(&path).unwrap();

    let second = ingestor.run_cycle(&mut clock()).unwrap();
    assert!(second.unchanged);
    assert_eq!(fs::read(&path).unwrap(), bytes_a);
    assert_eq!(read_meta(&path).unwrap().content_hash, first.meta.content_hash);

    let header = String::from_utf8(bytes_a).unwrap();
    assert!(header.starts_with("tempo,abertura,alto,baixo,fechamento,volume,moeda\n"));
}

#[test]
fn crypto_limit_is_passed_through() {
    let dir = tempfile::tempdir().unwrap();
    let exchange = FakeExchange {
        bars: [("SOL/USDT".to_string(), series(100.0))].into_iter().collect(),
        down: false,
    };
    let mut config = crypto_config(&["SOL/USDT"]);
    config.limit = 2;
    let report = CryptoIngestor::new(&exchange, &config, dir.path())
        .run_cycle(&mut clock())
        .unwrap();
    // last two raw bars: day 2 and the duplicate day 3
    assert_eq!(report.rows_written(), 2);
}

#[test]
fn scheduler_survives_failing_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let exchange = FakeExchange {
        bars: HashMap::new(),
        down: true,
    };
    let config = crypto_config(&["BTC/USDT"]);
    let ingestor = CryptoIngestor::new(&exchange, &config, dir.path());
    let scheduler =
        Scheduler::new(Duration::from_secs(config.interval_secs)).with_max_cycles(Some(3));
    let mut clock = clock();

    let summary = scheduler.run(&mut clock, |c: &mut dyn Clock| ingestor.run_cycle(c));
    assert_eq!(summary.cycles, 3);
    assert_eq!(summary.failed_cycles, 3);
    // two full intervals plus one 100ms backoff per cycle
    assert_eq!(
        clock.total_slept(),
        Duration::from_secs(2 * 86_400) + Duration::from_millis(300)
    );
    assert!(!dir.path().join("dadospg_cripto.csv").exists());
}

#[test]
fn blocked_provider_is_not_called() {
    let dir = tempfile::tempdir().unwrap();
    let provider = FakeEquity::new(&[("AAPL", 100.0), ("MSFT", 200.0)]);
    provider.blocked.store(true, Ordering::SeqCst);
    let ingestor = EquityIngestor::new(&provider, no_jitter(3), 730, dir.path());
    let universe = equity_universe(Market::ForeignEquity, &["AAPL", "MSFT"]);
    let mut clock = clock();

    let err = ingestor
        .run_market(&universe, &mut clock, &SilentProgress)
        .unwrap_err();
    match err {
        IngestError::AllSymbolsFailed { failures, .. } => {
            assert_eq!(failures.len(), 2);
            assert!(failures[0].reason.contains("circuit breaker"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(provider.calls.lock().unwrap().is_empty());
    assert!(clock.sleeps().is_empty());
}
