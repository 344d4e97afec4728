//! AlphaWave TUI: market dashboard over the ingested CSV files.
//!
//! Destinations:
//! 1. Home: product overview and data file status
//! 2. Crypto
//! 3. Domestic equities
//! 4. Foreign equities
//!
//! Each market page has a visualization view (close price per symbol) and an
//! analysis view with six tabs.

mod app;
mod input;
mod persistence;
mod theme;
mod ui;
mod worker;

use std::fs::{self, File};
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use alphawave_core::config::AppConfig;
use alphawave_runner::MarketLoader;

use crate::app::{AppState, ErrorCategory, MarketView};
use crate::worker::{WorkerCommand, WorkerResponse};

const LOG_ENV: &str = "ALPHAWAVE_LOG";

#[derive(Parser)]
#[command(name = "alphawave-tui", about = "AlphaWave market dashboard")]
struct Args {
    /// Path to a TOML config file. Built-in defaults apply when unset.
    #[arg(long, env = "ALPHAWAVE_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let app_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("alphawave");
    init_file_logging(&app_dir.join("tui.log"));

    let config = AppConfig::load(args.config.as_deref()).context("loading configuration")?;
    let state_path = app_dir.join("state.json");
    let download_dir = config
        .dashboard
        .download_dir
        .clone()
        .or_else(dirs::download_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    tracing::info!(
        data_dir = %config.data_dir.display(),
        download_dir = %download_dir.display(),
        "dashboard starting"
    );

    let persisted = persistence::load(&state_path);

    // Worker channels
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let worker_handle = worker::spawn_worker(
        cmd_rx,
        resp_tx,
        MarketLoader::from_config(&config),
        config.dashboard.clone(),
    )
    .context("spawning worker thread")?;

    let mut app = AppState::new(cmd_tx.clone(), resp_rx, config, download_dir);
    persistence::apply(&mut app, persisted);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    if let Err(e) = persistence::save(&state_path, &persistence::extract(&app)) {
        tracing::warn!(error = %e, "could not save UI state");
    }

    let _ = cmd_tx.send(WorkerCommand::Shutdown);
    let _ = worker_handle.join();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Log to a file so the terminal stays clean. Logging is skipped if the file
/// cannot be opened.
fn init_file_logging(path: &Path) {
    let file = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| File::options().create(true).append(true).open(path));
    let Ok(file) = file else {
        return;
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        // 1. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Drain worker responses (non-blocking)
        while let Ok(resp) = app.worker_rx.try_recv() {
            handle_worker_response(app, resp);
        }

        // 3. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        // 4. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}

fn handle_worker_response(app: &mut AppState, resp: WorkerResponse) {
    match resp {
        WorkerResponse::Loaded { market, view } => {
            let symbols = view.summary.symbols.len();
            let rejected = view.summary.rejected_rows;
            app.views.insert(market, MarketView::Ready(view));
            app.move_chart_cursor(0);
            if rejected > 0 {
                app.set_warning(format!(
                    "Data loaded: {symbols} symbols, {rejected} invalid rows skipped"
                ));
            } else {
                app.set_status(format!("Data loaded successfully: {symbols} symbols"));
            }
        }
        WorkerResponse::LoadFailed {
            market,
            missing,
            message,
        } => {
            app.views.insert(market, MarketView::Failed(message.clone()));
            let category = if missing {
                ErrorCategory::Missing
            } else {
                ErrorCategory::Data
            };
            app.push_error(category, message, format!("loading {market}"));
        }
        WorkerResponse::ReportSaved { path, bytes } => {
            app.set_status(format!("Report saved to {} ({bytes} bytes)", path.display()));
        }
        WorkerResponse::ReportFailed { message } => {
            app.push_error(ErrorCategory::Missing, message, "report download".into());
        }
        WorkerResponse::FileStatus(presence) => app.file_presence = presence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Destination, LoadSummary, LoadedView, StatusLevel};
    use alphawave_core::domain::Market;
    use std::collections::HashMap;

    fn app() -> AppState {
        let (tx, _rx) = mpsc::channel();
        let (_tx2, rx2) = mpsc::channel();
        AppState::new(tx, rx2, AppConfig::default(), PathBuf::from("."))
    }

    #[test]
    fn load_failure_halts_view_and_records_error() {
        let mut app = app();
        handle_worker_response(
            &mut app,
            WorkerResponse::LoadFailed {
                market: Market::Crypto,
                missing: false,
                message: "crypto file is missing required column(s): moeda".into(),
            },
        );
        assert!(matches!(app.view(Market::Crypto), Some(MarketView::Failed(_))));
        assert_eq!(app.error_history[0].category, ErrorCategory::Data);
        app.destination = Destination::Crypto;
        assert!(app.current_charts().is_empty());
    }

    #[test]
    fn loaded_response_confirms_in_status() {
        let mut app = app();
        let view = LoadedView {
            summary: LoadSummary {
                path: PathBuf::from("dadospg_cripto.csv"),
                symbols: vec!["BTC/USDT".into()],
                rows: 3,
                rejected_rows: 0,
                duplicate_rows: 0,
                written_at: None,
            },
            visualization: Vec::new(),
            panels: HashMap::new(),
        };
        handle_worker_response(
            &mut app,
            WorkerResponse::Loaded {
                market: Market::Crypto,
                view: Box::new(view),
            },
        );
        let (msg, level) = app.status_message.clone().unwrap();
        assert_eq!(level, StatusLevel::Info);
        assert!(msg.starts_with("Data loaded successfully"));
    }

    #[test]
    fn missing_report_is_non_fatal() {
        let mut app = app();
        handle_worker_response(
            &mut app,
            WorkerResponse::ReportFailed {
                message: "report not found at relatorio_completo.pdf".into(),
            },
        );
        assert!(app.running);
        assert_eq!(app.error_history.len(), 1);
    }

    #[test]
    fn file_status_replaces_presence() {
        let mut app = app();
        app.file_presence.insert(Market::Crypto, false);
        handle_worker_response(
            &mut app,
            WorkerResponse::FileStatus(HashMap::from([
                (Market::Crypto, true),
                (Market::ForeignEquity, false),
            ])),
        );
        assert_eq!(app.file_presence.get(&Market::Crypto), Some(&true));
        assert_eq!(app.file_presence.get(&Market::ForeignEquity), Some(&false));
        assert!(app.file_presence.get(&Market::DomesticEquity).is_none());
        assert!(app.status_message.is_none());
    }

    #[test]
    fn args_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn config_flag_sets_path() {
        let args = Args::try_parse_from(["alphawave-tui", "--config", "dash.toml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("dash.toml")));
        assert!(Args::try_parse_from(["alphawave-tui", "--theme", "dark"]).is_err());
    }
}
