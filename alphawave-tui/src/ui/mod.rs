//! Top-level UI layout: destination tabs, active view and status bar.

pub mod help_panel;
pub mod landing;
pub mod market_view;
pub mod overlays;
pub mod status_bar;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Tabs};
use ratatui::Frame;

use crate::app::{AppState, Destination, Overlay};
use crate::theme;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    // Split: tab strip + main area + 1-line status bar.
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_tabs(f, chunks[0], app);
    draw_destination(f, chunks[1], app);
    status_bar::render(f, chunks[2], app);

    match &app.overlay {
        Overlay::Welcome => overlays::render_welcome(f, chunks[1]),
        Overlay::Help => help_panel::render(f, chunks[1]),
        Overlay::ErrorHistory => overlays::render_error_history(f, chunks[1], app),
        Overlay::None => {}
    }
}

pub fn destination_label(app: &AppState, dest: Destination) -> String {
    match dest.market() {
        None => "Home".to_string(),
        Some(market) => app.config.universe(market).name.clone(),
    }
}

fn draw_tabs(f: &mut Frame, area: Rect, app: &AppState) {
    let titles: Vec<Line> = Destination::ALL
        .iter()
        .map(|&d| Line::from(format!(" {} {} ", d.index() + 1, destination_label(app, d))))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.destination.index())
        .style(theme::muted())
        .highlight_style(theme::tab_selected())
        .divider("|");
    f.render_widget(tabs, area);
}

fn draw_destination(f: &mut Frame, area: Rect, app: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(true))
        .title(format!(" {} ", destination_label(app, app.destination)))
        .title_style(theme::panel_title(true));

    let inner = block.inner(area);
    f.render_widget(block, area);

    match app.destination.market() {
        None => landing::render(f, inner, app),
        Some(market) => market_view::render(f, inner, app, market),
    }
}

/// Compute a centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
