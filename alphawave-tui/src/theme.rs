//! Parrot/neon theme tokens for the AlphaWave dashboard.
//!
//! # Color Palette
//! - **Accent**: Electric cyan (primary highlights, focus)
//! - **Positive**: Neon green (gains, success)
//! - **Negative**: Hot pink (losses, failures)
//! - **Warning**: Neon orange (alerts)
//! - **Neutral**: Cool purple (secondary info)
//! - **Muted**: Steel blue (secondary text)

use ratatui::style::{Color, Modifier, Style};

pub const BACKGROUND: Color = Color::Rgb(18, 18, 20);
pub const ACCENT: Color = Color::Rgb(0, 255, 255);
pub const POSITIVE: Color = Color::Rgb(0, 255, 128);
pub const NEGATIVE: Color = Color::Rgb(255, 20, 147);
pub const WARNING: Color = Color::Rgb(255, 140, 0);
pub const NEUTRAL: Color = Color::Rgb(147, 112, 219);
pub const MUTED: Color = Color::Rgb(100, 149, 237);
pub const TEXT_SECONDARY: Color = Color::Rgb(170, 170, 170);

/// Colors cycled through for multi-series charts.
pub const SERIES: [Color; 6] = [ACCENT, WARNING, POSITIVE, NEGATIVE, NEUTRAL, Color::Yellow];

pub fn series_color(index: usize) -> Color {
    SERIES[index % SERIES.len()]
}

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn neutral() -> Style {
    Style::default().fg(NEUTRAL)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn positive() -> Style {
    Style::default().fg(POSITIVE)
}

pub fn secondary() -> Style {
    Style::default().fg(TEXT_SECONDARY)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}

/// Highlight for the selected tab.
pub fn tab_selected() -> Style {
    Style::default()
        .fg(BACKGROUND)
        .bg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_colors_cycle() {
        assert_eq!(series_color(0), ACCENT);
        assert_eq!(series_color(SERIES.len()), ACCENT);
        assert_eq!(series_color(1), WARNING);
    }
}
