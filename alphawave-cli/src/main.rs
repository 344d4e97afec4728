//! AlphaWave CLI: ingestion and data file commands.
//!
//! Commands:
//! - `ingest equities`: fetch the trailing daily window for the domestic and
//!   foreign universes and rewrite their CSV files
//! - `ingest crypto`: poll the exchange on a fixed interval, overwriting the
//!   crypto CSV each cycle
//! - `validate`: read a market file back and report per-symbol coverage
//! - `config`: print the effective configuration as TOML

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use alphawave_core::config::{AppConfig, Credentials};
use alphawave_core::data::{BinanceProvider, CircuitBreaker, StdoutProgress, YahooProvider};
use alphawave_core::domain::Market;
use alphawave_runner::{
    load_market, CryptoIngestor, EquityIngestor, IngestReport, MarketData, Scheduler, SystemClock,
};

const LOG_ENV: &str = "ALPHAWAVE_LOG";

#[derive(Parser)]
#[command(
    name = "alphawave",
    about = "AlphaWave CLI: market data ingestion for the dashboard"
)]
struct Cli {
    /// Path to a TOML config file. Built-in defaults apply when unset.
    #[arg(long, global = true, env = "ALPHAWAVE_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter used when ALPHAWAVE_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch market data and rewrite the market files.
    Ingest {
        #[command(subcommand)]
        target: IngestTarget,
    },
    /// Read a market file and report what the dashboard would see.
    Validate {
        /// crypto, domestic (brasil) or foreign (usa).
        #[arg(long, value_parser = parse_market)]
        market: Market,

        /// Emit the report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the effective configuration.
    Config,
}

#[derive(Subcommand)]
enum IngestTarget {
    /// One batch run over the equity universes (Yahoo Finance).
    Equities {
        /// Restrict the run to one market: domestic (brasil) or foreign (usa).
        /// Defaults to both.
        #[arg(long, value_parser = parse_equity_market)]
        market: Option<Market>,
    },
    /// Scheduled exchange polling (Binance).
    Crypto {
        /// Run a single cycle and exit.
        #[arg(long, default_value_t = false, conflicts_with = "max_cycles")]
        once: bool,

        /// Stop after this many cycles.
        #[arg(long)]
        max_cycles: Option<u64>,

        /// Seconds between cycles. Overrides the config value.
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

fn parse_market(key: &str) -> Result<Market, String> {
    Market::from_key(key).ok_or_else(|| {
        format!("unknown market '{key}'. Valid: crypto, domestic, foreign")
    })
}

fn parse_equity_market(key: &str) -> Result<Market, String> {
    match parse_market(key)? {
        Market::Crypto => Err("crypto is ingested with `ingest crypto`".to_string()),
        equity => Ok(equity),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format)?;

    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Ingest { target } => match target {
            IngestTarget::Equities { market } => run_equities(&config, market),
            IngestTarget::Crypto {
                once,
                max_cycles,
                interval_secs,
            } => {
                let max_cycles = if once { Some(1) } else { max_cycles };
                run_crypto(&config, max_cycles, interval_secs)
            }
        },
        Commands::Validate { market, json } => run_validate(&config, market, json),
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|e| anyhow::anyhow!("invalid log filter: {e}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
    Ok(())
}

fn run_equities(config: &AppConfig, only: Option<Market>) -> Result<()> {
    let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
    let provider = YahooProvider::new(circuit_breaker).context("building Yahoo client")?;
    let ingestor = EquityIngestor::new(
        &provider,
        config.equity.retry,
        config.equity.lookback_days,
        &config.data_dir,
    );

    let universes: Vec<_> = [Market::DomesticEquity, Market::ForeignEquity]
        .into_iter()
        .filter(|m| only.map_or(true, |o| o == *m))
        .map(|m| config.universe(m))
        .collect();

    let mut clock = SystemClock;
    let results = ingestor.run_all(&universes, &mut clock, &StdoutProgress);

    let mut failed_markets = 0;
    for result in &results {
        match result {
            Ok(report) => print_report(report),
            Err(e) => {
                failed_markets += 1;
                eprintln!("Error: {e}");
            }
        }
    }

    if failed_markets == results.len() {
        bail!("no equity market was written");
    }
    Ok(())
}

fn run_crypto(config: &AppConfig, max_cycles: Option<u64>, interval_secs: Option<u64>) -> Result<()> {
    let credentials = Credentials::from_env();
    if credentials.binance_api_key.is_none() {
        tracing::info!("no exchange API key set; using public market data endpoints");
    }

    let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
    let exchange = BinanceProvider::new(circuit_breaker, credentials.binance_api_key)
        .context("building Binance client")?;
    let ingestor = CryptoIngestor::new(&exchange, &config.crypto, &config.data_dir);

    let interval = Duration::from_secs(interval_secs.unwrap_or(config.crypto.interval_secs));
    let scheduler = Scheduler::new(interval).with_max_cycles(max_cycles);

    tracing::info!(
        pairs = ingestor.universe().distinct_symbols().len(),
        interval_secs = interval.as_secs(),
        ?max_cycles,
        "crypto polling started"
    );

    let mut clock = SystemClock;
    let summary = scheduler.run(&mut clock, |clock| {
        let result = ingestor.run_cycle(clock);
        if let Ok(report) = &result {
            print_report(report);
        }
        result
    });

    println!(
        "Cycles: {} ({} failed, {} unchanged)",
        summary.cycles, summary.failed_cycles, summary.unchanged_cycles
    );
    if summary.cycles > 0 && summary.failed_cycles == summary.cycles {
        bail!("every crypto cycle failed");
    }
    Ok(())
}

fn run_validate(config: &AppConfig, market: Market, json: bool) -> Result<()> {
    let path = config.market_file(market);
    let data = load_market(market, &path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&validation_json(&data))?);
    } else {
        print_validation(&data);
    }
    Ok(())
}

fn validation_json(data: &MarketData) -> serde_json::Value {
    let symbols: Vec<serde_json::Value> = data
        .series
        .iter()
        .map(|s| {
            serde_json::json!({
                "symbol": s.symbol,
                "rows": s.bars.len(),
                "first": s.first_timestamp().map(|t| t.to_string()),
                "last": s.last_timestamp().map(|t| t.to_string()),
            })
        })
        .collect();
    serde_json::json!({
        "market": data.market.key(),
        "path": data.path.display().to_string(),
        "rows": data.row_count(),
        "rejected_rows": data.rejected_rows,
        "duplicate_rows": data.duplicate_rows,
        "written_at": data.meta.as_ref().map(|m| m.written_at.to_string()),
        "symbols": symbols,
    })
}

fn print_validation(data: &MarketData) {
    println!();
    println!("=== {} ===", data.market);
    println!("File:       {}", data.path.display());
    println!("Rows:       {}", data.row_count());
    println!("Symbols:    {}", data.series.len());
    if data.rejected_rows > 0 {
        println!("Invalid:    {}", data.rejected_rows);
    }
    if data.duplicate_rows > 0 {
        println!("Duplicates: {}", data.duplicate_rows);
    }
    if let Some(meta) = &data.meta {
        println!("Written at: {}", meta.written_at);
    }
    println!();
    println!("{:<14} {:>6}  {:<19}  {:<19}", "Symbol", "Rows", "First", "Last");
    for s in &data.series {
        println!(
            "{:<14} {:>6}  {:<19}  {:<19}",
            s.symbol,
            s.bars.len(),
            s.first_timestamp().map(|t| t.to_string()).unwrap_or_default(),
            s.last_timestamp().map(|t| t.to_string()).unwrap_or_default(),
        );
    }
    println!();
}

fn print_report(report: &IngestReport) {
    println!();
    println!("=== {} ===", report.market);
    println!("File:      {}", report.path.display());
    println!(
        "Symbols:   {} written, {} skipped",
        report.succeeded.len(),
        report.failed.len()
    );
    println!("Rows:      {}", report.rows_written());
    if report.unchanged {
        println!("Content unchanged since the previous write.");
    }
    for failure in &report.failed {
        println!("WARNING: {} skipped: {}", failure.symbol, failure.reason);
    }
}
