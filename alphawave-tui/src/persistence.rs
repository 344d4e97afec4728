//! App state persistence: JSON save/load across restarts.

use std::path::Path;

use serde::{Deserialize, Serialize};

use alphawave_runner::AnalysisPanel;

use crate::app::{AppState, Destination, Overlay, ViewMode};

/// Serializable subset of app state that persists across restarts.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub destination: Destination,
    pub view_mode: ViewMode,
    pub panel: AnalysisPanel,
    pub welcome_dismissed: bool,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            destination: Destination::Landing,
            view_mode: ViewMode::Visualization,
            panel: AnalysisPanel::Correlation,
            welcome_dismissed: false,
        }
    }
}

/// Load persisted state from disk. Returns defaults if file is missing or corrupt.
pub fn load(path: &Path) -> PersistedState {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt UI state");
            PersistedState::default()
        }),
        Err(_) => PersistedState::default(),
    }
}

/// Save persisted state to disk. Creates parent directories if needed.
pub fn save(path: &Path, state: &PersistedState) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn extract(app: &AppState) -> PersistedState {
    PersistedState {
        destination: app.destination,
        view_mode: app.view_mode,
        panel: app.panel,
        welcome_dismissed: app.overlay != Overlay::Welcome,
    }
}

/// Apply persisted state; navigating to a market destination triggers its load.
pub fn apply(app: &mut AppState, state: PersistedState) {
    app.view_mode = state.view_mode;
    app.panel = state.panel;
    app.go_to(state.destination);
    if !state.welcome_dismissed {
        app.overlay = Overlay::Welcome;
    }
}
