//! Home page: product description, feature list and data file status.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use alphawave_core::domain::Market;

use crate::app::{AppState, MarketView};
use crate::theme;

const FEATURES: [(&str, &str); 4] = [
    (
        "Per-market analysis",
        "crypto pairs, Brazilian equities and US equities, each from its own data file",
    ),
    (
        "Technical indicators",
        "50/200-day moving averages, MACD 12/26/9, daily return distribution",
    ),
    (
        "Terminal charts",
        "closing prices, volume/price correlation, risk vs return, trading volume",
    ),
    ("Downloadable report", "press d to save the full report to your downloads"),
];

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(6)])
        .split(area);

    let mut lines: Vec<Line> = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Market Analysis: Informed, Strategic Decisions",
            theme::accent_bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Welcome to AlphaWave, a data science workbench for financial markets. \
             It turns the daily files written by the ingestors into charts and \
             statistics that expose the trends and movements of each market.",
            theme::secondary(),
        )),
        Line::from(""),
        Line::from(Span::styled("Main features", theme::accent_bold())),
    ];
    for (title, desc) in FEATURES {
        lines.push(Line::from(vec![
            Span::styled(format!("  - {title}: "), theme::accent()),
            Span::styled(desc, theme::muted()),
        ]));
    }
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), chunks[0]);

    let mut status: Vec<Line> = vec![Line::from(Span::styled("Data files", theme::accent_bold()))];
    for market in Market::ALL {
        let universe = app.config.universe(market);
        let (text, style) = match app.view(market) {
            Some(MarketView::Ready(view)) => (
                format!("loaded, {} rows", view.summary.rows),
                theme::positive(),
            ),
            Some(MarketView::Loading) => ("loading".to_string(), theme::warning()),
            Some(MarketView::Failed(_)) => ("error (see the market page)".to_string(), theme::negative()),
            Some(MarketView::NotLoaded) | None => match app.file_presence.get(&market) {
                Some(true) => ("present".to_string(), theme::muted()),
                Some(false) => ("missing".to_string(), theme::warning()),
                None => ("checking".to_string(), theme::muted()),
            },
        };
        status.push(Line::from(vec![
            Span::styled(format!("  {:<18}", universe.name), theme::muted()),
            Span::styled(format!("{:<22}", universe.file), theme::secondary()),
            Span::styled(text, style),
        ]));
    }
    f.render_widget(Paragraph::new(status), chunks[1]);
}
