//! Market page: view/tab strip, load summary, the focused chart and its notes.

use chrono::DateTime;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Tabs, Wrap};
use ratatui::Frame;

use alphawave_core::domain::Market;
use alphawave_runner::{AnalysisPanel, AxisKind, ChartSpec, SeriesKind};

use crate::app::{AppState, LoadedView, MarketView, ViewMode};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState, market: Market) {
    match app.view(market) {
        Some(MarketView::Ready(view)) => render_loaded(f, area, app, view),
        Some(MarketView::Failed(message)) => render_failed(f, area, message),
        Some(MarketView::Loading) | Some(MarketView::NotLoaded) | None => {
            let text = Paragraph::new(Span::styled("Loading data...", theme::muted()));
            f.render_widget(text, area);
        }
    }
}

/// Validation errors halt the view: only the message is drawn.
fn render_failed(f: &mut Frame, area: Rect, message: &str) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Could not load this market", theme::negative())),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), theme::secondary())),
        Line::from(""),
        Line::from(Span::styled(
            "Fix the file or run the ingestor, then press r to reload.",
            theme::muted(),
        )),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_loaded(f: &mut Frame, area: Rect, app: &AppState, view: &LoadedView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(area);

    render_tabs(f, chunks[0], app);
    render_summary(f, chunks[1], view);

    let charts = app.current_charts();
    match charts.get(app.chart_cursor) {
        Some(chart) => {
            let title = format!(" {} [{}/{}] ", chart.title, app.chart_cursor + 1, charts.len());
            render_chart(f, chunks[2], chart, &title);
            render_notes(f, chunks[3], chart);
        }
        None => {
            let text = Paragraph::new(Span::styled("No charts for this view.", theme::muted()));
            f.render_widget(text, chunks[2]);
        }
    }
}

fn render_tabs(f: &mut Frame, area: Rect, app: &AppState) {
    match app.view_mode {
        ViewMode::Visualization => {
            let line = Line::from(vec![
                Span::styled(format!(" {} ", app.view_mode.label()), theme::tab_selected()),
                Span::styled("  (v: analysis)", theme::muted()),
            ]);
            f.render_widget(Paragraph::new(line), area);
        }
        ViewMode::Analysis => {
            let titles: Vec<Line> = AnalysisPanel::ALL
                .iter()
                .map(|p| Line::from(p.title()))
                .collect();
            let tabs = Tabs::new(titles)
                .select(app.panel.index())
                .style(theme::muted())
                .highlight_style(theme::tab_selected())
                .divider("|");
            f.render_widget(tabs, area);
        }
    }
}

fn render_summary(f: &mut Frame, area: Rect, view: &LoadedView) {
    let s = &view.summary;
    let file = s
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut spans = vec![
        Span::styled("Data loaded successfully. ", theme::positive()),
        Span::styled(format!("{file}: "), theme::muted()),
        Span::styled(
            format!("{} symbols, {} rows", s.symbols.len(), s.rows),
            theme::secondary(),
        ),
    ];
    if s.rejected_rows + s.duplicate_rows > 0 {
        spans.push(Span::styled(
            format!(
                " ({} invalid, {} duplicate rows skipped)",
                s.rejected_rows, s.duplicate_rows
            ),
            theme::warning(),
        ));
    }
    if let Some(at) = s.written_at {
        spans.push(Span::styled(
            format!("  written {}", at.format("%Y-%m-%d %H:%M")),
            theme::muted(),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_chart(f: &mut Frame, area: Rect, spec: &ChartSpec, title: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::muted())
        .title(Span::styled(title.to_string(), theme::accent_bold()));

    let Some((x_bounds, y_bounds)) = spec.bounds() else {
        let text = Paragraph::new(Span::styled("Not enough data to plot.", theme::muted()))
            .block(block);
        f.render_widget(text, area);
        return;
    };

    let datasets: Vec<Dataset> = spec
        .series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let (graph, marker) = match s.kind {
                SeriesKind::Line => (GraphType::Line, symbols::Marker::Braille),
                SeriesKind::Scatter => (GraphType::Scatter, symbols::Marker::Dot),
                SeriesKind::Bars => (GraphType::Bar, symbols::Marker::HalfBlock),
            };
            Dataset::default()
                .name(s.name.clone())
                .marker(marker)
                .graph_type(graph)
                .style(Style::default().fg(theme::series_color(i)))
                .data(&s.points)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title(Span::styled(spec.x_label.clone(), theme::muted()))
                .style(theme::muted())
                .bounds(x_bounds)
                .labels(axis_labels(x_bounds, spec.x_axis)),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled(spec.y_label.clone(), theme::muted()))
                .style(theme::muted())
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds, AxisKind::Value)),
        );
    f.render_widget(chart, area);
}

fn render_notes(f: &mut Frame, area: Rect, spec: &ChartSpec) {
    let lines: Vec<Line> = spec
        .notes
        .iter()
        .map(|n| Line::from(Span::styled(n.clone(), theme::accent())))
        .collect();
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
}

/// Low, middle and high tick labels.
pub fn axis_labels(bounds: [f64; 2], kind: AxisKind) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .into_iter()
        .map(|v| Span::styled(format_tick(v, kind), theme::muted()))
        .collect()
}

pub fn format_tick(value: f64, kind: AxisKind) -> String {
    match kind {
        AxisKind::Time => DateTime::from_timestamp(value as i64, 0)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        AxisKind::Value => {
            let abs = value.abs();
            if abs >= 1e9 {
                format!("{:.1}B", value / 1e9)
            } else if abs >= 1e6 {
                format!("{:.1}M", value / 1e6)
            } else if abs >= 1e3 {
                format!("{:.1}k", value / 1e3)
            } else if abs >= 1.0 || abs == 0.0 {
                format!("{value:.2}")
            } else {
                format!("{value:.4}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_ticks_are_dates() {
        assert_eq!(format_tick(1_704_067_200.0, AxisKind::Time), "2024-01-01");
    }

    #[test]
    fn value_ticks_scale() {
        assert_eq!(format_tick(2_500_000.0, AxisKind::Value), "2.5M");
        assert_eq!(format_tick(0.01234, AxisKind::Value), "0.0123");
        assert_eq!(format_tick(42.0, AxisKind::Value), "42.00");
        assert_eq!(format_tick(0.0, AxisKind::Value), "0.00");
    }

    #[test]
    fn three_labels_per_axis() {
        assert_eq!(axis_labels([0.0, 10.0], AxisKind::Value).len(), 3);
    }
}
