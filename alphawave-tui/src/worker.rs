//! Background worker thread: file I/O and chart preparation run here.
//!
//! Communication with the TUI main thread is via `mpsc` channels. The worker
//! owns the [`MarketLoader`], so the per-market memo lives for the session.
//! Per-symbol derivations run on a private rayon pool.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use alphawave_core::config::DashboardConfig;
use alphawave_core::domain::Market;
use alphawave_runner::{
    download_report, AnalysisPanel, LoadError, MarketAnalysis, MarketData, MarketLoader,
};

use crate::app::{LoadSummary, LoadedView};

/// Commands sent from the TUI to the worker.
#[derive(Debug)]
pub enum WorkerCommand {
    Load {
        market: Market,
        /// Drop the memo first.
        reload: bool,
    },
    DownloadReport {
        source: PathBuf,
        dest_dir: PathBuf,
        file_name: String,
    },
    /// Check which market files exist on disk.
    ScanFiles,
    Shutdown,
}

/// Responses sent from the worker back to the TUI.
#[derive(Debug)]
pub enum WorkerResponse {
    Loaded {
        market: Market,
        view: Box<LoadedView>,
    },
    LoadFailed {
        market: Market,
        missing: bool,
        message: String,
    },
    ReportSaved {
        path: PathBuf,
        bytes: u64,
    },
    ReportFailed {
        message: String,
    },
    FileStatus(HashMap<Market, bool>),
}

/// Spawn the background worker thread.
pub fn spawn_worker(
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    loader: MarketLoader,
    dashboard: DashboardConfig,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("alphawave-worker".into())
        .spawn(move || worker_loop(rx, tx, loader, dashboard))
}

fn worker_loop(
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    mut loader: MarketLoader,
    dashboard: DashboardConfig,
) {
    // Private pool so chart preparation never competes with the global one.
    let pool = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("alphawave-pool-{i}"))
        .build();
    if let Err(e) = &pool {
        tracing::warn!(error = %e, "worker pool unavailable, using the global pool");
    }

    loop {
        let response = match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(WorkerCommand::Load { market, reload }) => {
                let mut run = || load_view(&mut loader, market, reload, &dashboard);
                match &pool {
                    Ok(pool) => pool.install(run),
                    Err(_) => run(),
                }
            }
            Ok(WorkerCommand::ScanFiles) => WorkerResponse::FileStatus(scan_files(&loader)),
            Ok(WorkerCommand::DownloadReport {
                source,
                dest_dir,
                file_name,
            }) => match download_report(&source, &dest_dir, &file_name) {
                Ok((path, bytes)) => WorkerResponse::ReportSaved { path, bytes },
                Err(e) => WorkerResponse::ReportFailed {
                    message: e.to_string(),
                },
            },
        };
        if tx.send(response).is_err() {
            break;
        }
    }
    tracing::debug!("worker stopped");
}

/// Load (or reuse) a market and prepare every chart for it.
pub fn load_view(
    loader: &mut MarketLoader,
    market: Market,
    reload: bool,
    dashboard: &DashboardConfig,
) -> WorkerResponse {
    let loaded = if reload {
        loader.reload(market)
    } else {
        loader.load(market)
    };
    match loaded {
        Ok(data) => WorkerResponse::Loaded {
            market,
            view: Box::new(build_view(&data, dashboard)),
        },
        Err(e) => WorkerResponse::LoadFailed {
            market,
            missing: matches!(e, LoadError::Missing { .. }),
            message: e.to_string(),
        },
    }
}

/// Presence of each configured market file. Unconfigured markets count as missing.
pub fn scan_files(loader: &MarketLoader) -> HashMap<Market, bool> {
    Market::ALL
        .into_iter()
        .map(|m| (m, loader.path(m).is_some_and(|p| p.is_file())))
        .collect()
}

fn build_view(data: &MarketData, dashboard: &DashboardConfig) -> LoadedView {
    let analysis = MarketAnalysis::compute(data, dashboard);
    let panels = AnalysisPanel::ALL
        .iter()
        .map(|&p| (p, analysis.panel(p)))
        .collect::<HashMap<_, _>>();
    LoadedView {
        summary: LoadSummary {
            path: data.path.clone(),
            symbols: data.symbols().into_iter().map(String::from).collect(),
            rows: data.row_count(),
            rejected_rows: data.rejected_rows,
            duplicate_rows: data.duplicate_rows,
            written_at: data.meta.as_ref().map(|m| m.written_at),
        },
        visualization: analysis.visualization(),
        panels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn loader(path: PathBuf) -> MarketLoader {
        MarketLoader::new(HashMap::from([(Market::Crypto, path)]))
    }

    #[test]
    fn missing_file_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = loader(dir.path().join("none.csv"));
        match load_view(&mut loader, Market::Crypto, false, &DashboardConfig::default()) {
            WorkerResponse::LoadFailed { missing, .. } => assert!(missing),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn loaded_view_has_every_panel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.csv");
        let mut csv = String::from("tempo,abertura,alto,baixo,fechamento,volume,moeda\n");
        for d in 1..=9 {
            csv.push_str(&format!("2024-01-0{d} 00:00:00,1,1,1,{},{},BTC/USDT\n", 10 + d, d * 3));
        }
        fs::write(&path, csv).unwrap();

        let mut loader = loader(path);
        match load_view(&mut loader, Market::Crypto, false, &DashboardConfig::default()) {
            WorkerResponse::Loaded { view, .. } => {
                assert_eq!(view.summary.symbols, vec!["BTC/USDT"]);
                assert_eq!(view.summary.rows, 9);
                assert_eq!(view.visualization.len(), 1);
                assert_eq!(view.panels.len(), AnalysisPanel::ALL.len());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    fn write_crypto_file(path: &std::path::Path) {
        let mut csv = String::from("tempo,abertura,alto,baixo,fechamento,volume,moeda\n");
        for d in 1..=5 {
            csv.push_str(&format!("2024-01-0{d} 00:00:00,1,1,1,{},{},ETH/USDT\n", 20 + d, d));
        }
        fs::write(path, csv).unwrap();
    }

    #[test]
    fn scan_reports_present_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("cripto.csv");
        fs::write(&present, "tempo\n").unwrap();
        let loader = MarketLoader::new(HashMap::from([
            (Market::Crypto, present),
            (Market::DomesticEquity, dir.path().join("absent.csv")),
        ]));

        let status = scan_files(&loader);
        assert_eq!(status.len(), Market::ALL.len());
        assert_eq!(status[&Market::Crypto], true);
        assert_eq!(status[&Market::DomesticEquity], false);
        assert_eq!(status[&Market::ForeignEquity], false);
    }

    #[test]
    fn worker_thread_serves_commands_until_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.csv");
        write_crypto_file(&path);

        let (cmd_tx, cmd_rx) = std::sync::mpsc::channel();
        let (resp_tx, resp_rx) = std::sync::mpsc::channel();
        let handle = spawn_worker(cmd_rx, resp_tx, loader(path), DashboardConfig::default()).unwrap();

        cmd_tx.send(WorkerCommand::ScanFiles).unwrap();
        match resp_rx.recv().unwrap() {
            WorkerResponse::FileStatus(status) => assert_eq!(status[&Market::Crypto], true),
            other => panic!("unexpected {other:?}"),
        }

        cmd_tx
            .send(WorkerCommand::Load {
                market: Market::Crypto,
                reload: false,
            })
            .unwrap();
        match resp_rx.recv().unwrap() {
            WorkerResponse::Loaded { market, view } => {
                assert_eq!(market, Market::Crypto);
                assert_eq!(view.summary.rows, 5);
            }
            other => panic!("unexpected {other:?}"),
        }

        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().unwrap();
        assert!(resp_rx.try_recv().is_err());
    }
}
