//! Bottom line: key hints on the left, latest status on the right.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::text::Span;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{AppState, StatusLevel};
use crate::theme;

const MARKET_HINTS: &str = " 1-4 go  v view  h/l tab  j/k chart  r reload  d report  ? help  q quit";
const LANDING_HINTS: &str = " 1-4 go  d report  ? help  q quit";

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let hints = if app.destination.market().is_some() {
        MARKET_HINTS
    } else {
        LANDING_HINTS
    };
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(hints.len() as u16 + 1), Constraint::Min(0)])
        .split(area);

    f.render_widget(Paragraph::new(Span::styled(hints, theme::muted())), halves[0]);

    if let Some((msg, level)) = &app.status_message {
        let style = match level {
            StatusLevel::Info => theme::positive(),
            StatusLevel::Warning => theme::warning(),
            StatusLevel::Error => theme::negative(),
        };
        let status = Paragraph::new(Span::styled(format!("{msg} "), style)).alignment(Alignment::Right);
        f.render_widget(status, halves[1]);
    }
}
