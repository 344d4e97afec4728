//! Help overlay: keyboard shortcuts.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::theme;
use crate::ui::centered_rect;

pub fn render(f: &mut Frame, area: Rect) {
    let popup = centered_rect(70, 80, area);
    f.render_widget(Clear, popup);

    let mut lines: Vec<Line> = Vec::new();

    section(&mut lines, "Navigation");
    key(&mut lines, "1 / 2 / 3 / 4", "Home / crypto / domestic / foreign equities");
    key(&mut lines, "Tab / Shift+Tab", "Cycle destinations forward / back");
    key(&mut lines, "q", "Quit");
    lines.push(Line::from(""));

    section(&mut lines, "Market views");
    key(&mut lines, "v", "Toggle visualization / analysis");
    key(&mut lines, "h / l", "Previous / next analysis tab");
    key(&mut lines, "j / k", "Next / previous symbol chart");
    key(&mut lines, "r", "Reload the market file from disk");
    lines.push(Line::from(""));

    section(&mut lines, "Anywhere");
    key(&mut lines, "d", "Download the full report");
    key(&mut lines, "e", "Open error history");
    key(&mut lines, "?", "Toggle this help");

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::accent())
        .title(" Help [Esc]close ")
        .title_style(theme::accent_bold());
    f.render_widget(Paragraph::new(lines).block(block), popup);
}

fn section(lines: &mut Vec<Line<'_>>, title: &str) {
    lines.push(Line::from(Span::styled(title.to_string(), theme::accent_bold())));
}

fn key(lines: &mut Vec<Line<'_>>, keys: &str, desc: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {:>18}  ", keys), theme::accent()),
        Span::styled(desc.to_string(), theme::muted()),
    ]));
}
