//! Overlay widgets: first-run welcome and the error log.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;
use crate::ui::centered_rect;

const GETTING_STARTED: [&str; 4] = [
    "Run `alphawave ingest equities` and `alphawave ingest crypto --once`",
    "Press 2, 3 or 4 to open a market",
    "Press v for the analysis tabs, h/l to move between them",
    "Press ? for every shortcut",
];

pub fn render_welcome(f: &mut Frame, area: Rect) {
    let popup = centered_rect(60, 40, area);
    f.render_widget(Clear, popup);

    let mut text = vec![
        Line::from(""),
        Line::from(Span::styled("Getting started", theme::accent_bold())),
        Line::from(""),
    ];
    text.extend(
        GETTING_STARTED
            .iter()
            .enumerate()
            .map(|(i, step)| Line::from(Span::styled(format!("  {}. {step}", i + 1), theme::muted()))),
    );
    text.push(Line::from(""));
    text.push(Line::from(Span::styled("Any key closes this window.", theme::neutral())));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::accent())
        .title(Span::styled(" AlphaWave ", theme::accent_bold()));
    f.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: true }), popup);
}

/// Load and report failures, newest last, one table row each.
pub fn render_error_history(f: &mut Frame, area: Rect, app: &AppState) {
    let popup = centered_rect(80, 70, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::negative())
        .title(Span::styled(
            format!(" Errors: {}  (Esc close, j/k scroll) ", app.error_history.len()),
            theme::negative(),
        ));

    if app.error_history.is_empty() {
        let text = Paragraph::new(Span::styled("Nothing has failed this session.", theme::muted()))
            .block(block);
        f.render_widget(text, popup);
        return;
    }

    let rows: Vec<Row> = app
        .error_history
        .iter()
        .enumerate()
        .skip(app.error_scroll)
        .map(|(i, err)| {
            let message_style = if i == app.error_scroll {
                theme::negative().add_modifier(Modifier::BOLD)
            } else {
                theme::secondary()
            };
            Row::new(vec![
                Cell::from(err.timestamp.format("%H:%M:%S").to_string()).style(theme::muted()),
                Cell::from(err.category.label()).style(theme::warning()),
                Cell::from(err.context.clone()).style(theme::muted()),
                Cell::from(err.message.clone()).style(message_style),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(4),
            Constraint::Length(18),
            Constraint::Min(20),
        ],
    )
    .header(Row::new(vec!["time", "kind", "while", "message"]).style(theme::accent_bold()))
    .column_spacing(1)
    .block(block);
    f.render_widget(table, popup);
}
