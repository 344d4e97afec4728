//! Application state: single-owner, main-thread only.
//!
//! All TUI state lives here. The worker thread communicates via channels.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use alphawave_core::config::AppConfig;
use alphawave_core::domain::Market;
use alphawave_runner::{AnalysisPanel, ChartSpec};

use crate::worker::{WorkerCommand, WorkerResponse};

const ERROR_HISTORY_CAP: usize = 50;

/// Top-level navigation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    Landing,
    Crypto,
    Domestic,
    Foreign,
}

impl Destination {
    pub const ALL: [Destination; 4] = [
        Destination::Landing,
        Destination::Crypto,
        Destination::Domestic,
        Destination::Foreign,
    ];

    pub fn index(self) -> usize {
        match self {
            Destination::Landing => 0,
            Destination::Crypto => 1,
            Destination::Domestic => 2,
            Destination::Foreign => 3,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    pub fn market(self) -> Option<Market> {
        match self {
            Destination::Landing => None,
            Destination::Crypto => Some(Market::Crypto),
            Destination::Domestic => Some(Market::DomesticEquity),
            Destination::Foreign => Some(Market::ForeignEquity),
        }
    }

    pub fn next(self) -> Destination {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Destination {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    Visualization,
    Analysis,
}

impl ViewMode {
    pub fn toggle(self) -> Self {
        match self {
            ViewMode::Visualization => ViewMode::Analysis,
            ViewMode::Analysis => ViewMode::Visualization,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Visualization => "Visualization",
            ViewMode::Analysis => "Analysis",
        }
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// An error record for the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Schema or row validation failed.
    Data,
    /// A file that should exist does not.
    Missing,
    Other,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Data => "DATA",
            ErrorCategory::Missing => "MISS",
            ErrorCategory::Other => "ERR",
        }
    }
}

/// What the loader reported about a market file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    pub path: PathBuf,
    pub symbols: Vec<String>,
    pub rows: usize,
    pub rejected_rows: usize,
    pub duplicate_rows: usize,
    pub written_at: Option<NaiveDateTime>,
}

/// Charts prepared by the worker for one market.
#[derive(Debug, Clone)]
pub struct LoadedView {
    pub summary: LoadSummary,
    pub visualization: Vec<ChartSpec>,
    pub panels: HashMap<AnalysisPanel, Vec<ChartSpec>>,
}

/// Per-market view state.
#[derive(Debug, Default)]
pub enum MarketView {
    #[default]
    NotLoaded,
    Loading,
    Ready(Box<LoadedView>),
    /// Validation or missing-file error; the view renders only the message.
    Failed(String),
}

/// Which overlay (if any) is shown on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    None,
    Welcome,
    Help,
    ErrorHistory,
}

/// Top-level application state.
pub struct AppState {
    // Navigation
    pub destination: Destination,
    pub view_mode: ViewMode,
    pub panel: AnalysisPanel,
    /// Index of the chart in focus within the current view.
    pub chart_cursor: usize,
    pub running: bool,

    pub views: HashMap<Market, MarketView>,
    /// Last file scan from the worker. Absent until the first scan lands.
    pub file_presence: HashMap<Market, bool>,

    // Worker communication
    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<WorkerResponse>,

    // Cross-cutting
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,
    pub overlay: Overlay,

    pub config: AppConfig,
    pub download_dir: PathBuf,
}

impl AppState {
    pub fn new(
        worker_tx: Sender<WorkerCommand>,
        worker_rx: Receiver<WorkerResponse>,
        config: AppConfig,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            destination: Destination::Landing,
            view_mode: ViewMode::Visualization,
            panel: AnalysisPanel::Correlation,
            chart_cursor: 0,
            running: true,
            views: HashMap::new(),
            file_presence: HashMap::new(),
            worker_tx,
            worker_rx,
            status_message: None,
            error_history: VecDeque::with_capacity(ERROR_HISTORY_CAP),
            error_scroll: 0,
            overlay: Overlay::None,
            config,
            download_dir,
        }
    }

    /// Push an error to the history, capping at 50.
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        tracing::warn!(category = category.label(), %message, %context, "ui error");
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
            context,
        };
        self.error_history.push_front(record);
        if self.error_history.len() > ERROR_HISTORY_CAP {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    pub fn view(&self, market: Market) -> Option<&MarketView> {
        self.views.get(&market)
    }

    /// Loaded view for the current destination, if any.
    pub fn current_loaded(&self) -> Option<&LoadedView> {
        match self.destination.market().and_then(|m| self.views.get(&m)) {
            Some(MarketView::Ready(view)) => Some(view),
            _ => None,
        }
    }

    /// Charts shown in the current view mode.
    pub fn current_charts(&self) -> &[ChartSpec] {
        let Some(view) = self.current_loaded() else {
            return &[];
        };
        match self.view_mode {
            ViewMode::Visualization => &view.visualization,
            ViewMode::Analysis => view
                .panels
                .get(&self.panel)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        }
    }

    /// Navigate, loading the market on first visit. The landing page
    /// refreshes the data file status each time it is shown.
    pub fn go_to(&mut self, destination: Destination) {
        self.destination = destination;
        self.chart_cursor = 0;
        match destination.market() {
            Some(market) => {
                if matches!(self.view(market), None | Some(MarketView::NotLoaded)) {
                    self.request_load(market, false);
                }
            }
            None => self.request_file_scan(),
        }
    }

    /// Ask the worker which market files exist. The landing page keeps
    /// showing the previous scan if the worker is gone.
    pub fn request_file_scan(&mut self) {
        if self.worker_tx.send(WorkerCommand::ScanFiles).is_err() {
            tracing::warn!("file scan skipped: background worker is not running");
        }
    }

    /// Ask the worker to (re)load `market`.
    pub fn request_load(&mut self, market: Market, reload: bool) {
        if matches!(self.view(market), Some(MarketView::Loading)) {
            return;
        }
        let cmd = WorkerCommand::Load { market, reload };
        if self.worker_tx.send(cmd).is_err() {
            self.push_error(
                ErrorCategory::Other,
                "background worker is not running".into(),
                market.to_string(),
            );
            return;
        }
        self.views.insert(market, MarketView::Loading);
        self.set_status(if reload {
            format!("Reloading {market} data...")
        } else {
            format!("Loading {market} data...")
        });
    }

    pub fn request_report(&mut self) {
        let cmd = WorkerCommand::DownloadReport {
            source: self.config.dashboard.report_path.clone(),
            dest_dir: self.download_dir.clone(),
            file_name: self.config.dashboard.report_download_name.clone(),
        };
        if self.worker_tx.send(cmd).is_err() {
            self.push_error(
                ErrorCategory::Other,
                "background worker is not running".into(),
                "report download".into(),
            );
            return;
        }
        self.set_status("Downloading report...");
    }

    pub fn move_chart_cursor(&mut self, delta: isize) {
        let len = self.current_charts().len();
        if len == 0 {
            self.chart_cursor = 0;
            return;
        }
        let next = self.chart_cursor as isize + delta;
        self.chart_cursor = next.clamp(0, len as isize - 1) as usize;
    }
}
