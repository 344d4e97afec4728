//! Chart descriptions for the dashboard views.
//!
//! Each analysis panel is evaluated over whichever symbols the loaded table
//! holds and produces plain [`ChartSpec`] values: named point series plus a few
//! text notes. Rendering is the front end's business.
//!
//! Time axes carry Unix seconds as `f64`.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use alphawave_core::config::DashboardConfig;
use alphawave_core::indicators::{DerivedSeries, IndicatorWindows};
use alphawave_core::stats::{density_histogram, linspace, mean, sample_std, LinearFit, NormalFit};

use crate::loader::MarketData;

/// The six analysis tabs, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisPanel {
    Correlation,
    MovingAverages,
    Macd,
    ReturnDistribution,
    RiskReturn,
    Volume,
}

impl AnalysisPanel {
    pub const ALL: [AnalysisPanel; 6] = [
        AnalysisPanel::Correlation,
        AnalysisPanel::MovingAverages,
        AnalysisPanel::Macd,
        AnalysisPanel::ReturnDistribution,
        AnalysisPanel::RiskReturn,
        AnalysisPanel::Volume,
    ];

    pub fn title(self) -> &'static str {
        match self {
            AnalysisPanel::Correlation => "Correlation",
            AnalysisPanel::MovingAverages => "Moving Averages",
            AnalysisPanel::Macd => "MACD",
            AnalysisPanel::ReturnDistribution => "Return Distribution",
            AnalysisPanel::RiskReturn => "Risk / Return",
            AnalysisPanel::Volume => "Volume",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesKind {
    Line,
    Scatter,
    Bars,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisKind {
    /// Unix seconds.
    Time,
    Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    pub name: String,
    pub kind: SeriesKind,
    /// Finite points only; warmup NaNs are dropped.
    pub points: Vec<(f64, f64)>,
}

impl SeriesSpec {
    fn new(name: impl Into<String>, kind: SeriesKind, points: Vec<(f64, f64)>) -> Self {
        Self {
            name: name.into(),
            kind,
            points: points
                .into_iter()
                .filter(|(x, y)| x.is_finite() && y.is_finite())
                .collect(),
        }
    }

    fn over_time(name: &str, kind: SeriesKind, xs: &[f64], ys: &[f64]) -> Self {
        Self::new(name, kind, xs.iter().copied().zip(ys.iter().copied()).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_axis: AxisKind,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<SeriesSpec>,
    pub notes: Vec<String>,
}

impl ChartSpec {
    fn new(title: String, x_axis: AxisKind, x_label: &str, y_label: &str) -> Self {
        Self {
            title,
            x_axis,
            x_label: x_label.into(),
            y_label: y_label.into(),
            series: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Bounds over every series, padded when degenerate.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let mut points = self.series.iter().flat_map(|s| s.points.iter());
        let &(x0, y0) = points.next()?;
        let (mut x, mut y) = ([x0, x0], [y0, y0]);
        for &(px, py) in points {
            x = [x[0].min(px), x[1].max(px)];
            y = [y[0].min(py), y[1].max(py)];
        }
        Some((pad(x), pad(y)))
    }

    pub fn has_data(&self) -> bool {
        self.series.iter().any(|s| !s.points.is_empty())
    }
}

fn pad(range: [f64; 2]) -> [f64; 2] {
    if range[0] == range[1] {
        let d = if range[0] == 0.0 { 1.0 } else { range[0].abs() * 0.05 };
        [range[0] - d, range[1] + d]
    } else {
        range
    }
}

/// Derived series for every symbol of a loaded market.
#[derive(Debug, Clone)]
pub struct MarketAnalysis {
    pub derived: Vec<DerivedSeries>,
    histogram_bins: usize,
    density_points: usize,
}

impl MarketAnalysis {
    /// Compute per-symbol derivations in parallel; order follows `data`.
    pub fn compute(data: &MarketData, config: &DashboardConfig) -> Self {
        Self::with_windows(data, &config.windows, config.histogram_bins, config.density_points)
    }

    pub fn with_windows(
        data: &MarketData,
        windows: &IndicatorWindows,
        histogram_bins: usize,
        density_points: usize,
    ) -> Self {
        let derived = data
            .series
            .par_iter()
            .map(|s| DerivedSeries::compute(&s.symbol, &s.bars, windows))
            .collect();
        Self {
            derived,
            histogram_bins,
            density_points,
        }
    }

    /// One close-price line chart per symbol.
    pub fn visualization(&self) -> Vec<ChartSpec> {
        self.derived
            .iter()
            .map(|d| {
                let mut chart = ChartSpec::new(
                    format!("Closing price over time for {}", d.symbol),
                    AxisKind::Time,
                    "time",
                    "close",
                );
                chart.series.push(SeriesSpec::over_time(
                    "close",
                    SeriesKind::Line,
                    &time_axis(d),
                    &d.close,
                ));
                chart
            })
            .collect()
    }

    pub fn panel(&self, panel: AnalysisPanel) -> Vec<ChartSpec> {
        match panel {
            AnalysisPanel::Correlation => self.derived.iter().map(correlation_chart).collect(),
            AnalysisPanel::MovingAverages => {
                self.derived.iter().map(moving_average_chart).collect()
            }
            AnalysisPanel::Macd => self.derived.iter().map(macd_chart).collect(),
            AnalysisPanel::ReturnDistribution => self
                .derived
                .iter()
                .map(|d| distribution_chart(d, self.histogram_bins, self.density_points))
                .collect(),
            AnalysisPanel::RiskReturn => vec![risk_return_chart(&self.derived)],
            AnalysisPanel::Volume => self.derived.iter().map(volume_chart).collect(),
        }
    }
}

fn time_axis(d: &DerivedSeries) -> Vec<f64> {
    d.timestamps
        .iter()
        .map(|t| t.and_utc().timestamp() as f64)
        .collect()
}

fn correlation_chart(d: &DerivedSeries) -> ChartSpec {
    let mut chart = ChartSpec::new(
        format!("Volume vs closing price for {}", d.symbol),
        AxisKind::Value,
        "volume",
        "close",
    );
    let points: Vec<(f64, f64)> = d.volume.iter().copied().zip(d.close.iter().copied()).collect();
    chart
        .series
        .push(SeriesSpec::new(d.symbol.clone(), SeriesKind::Scatter, points));

    match LinearFit::fit(&d.volume, &d.close) {
        Some(fit) => {
            let lo = d.volume.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = d.volume.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            chart.series.push(SeriesSpec::new(
                "OLS trend",
                SeriesKind::Line,
                vec![(lo, fit.predict(lo)), (hi, fit.predict(hi))],
            ));
            chart.notes.push(format!(
                "Correlation between volume and closing price for {}: {:.2}",
                d.symbol, fit.r
            ));
        }
        None => chart.notes.push(format!(
            "Correlation between volume and closing price for {}: n/a",
            d.symbol
        )),
    }
    chart
}

fn moving_average_chart(d: &DerivedSeries) -> ChartSpec {
    let xs = time_axis(d);
    let mut chart = ChartSpec::new(
        format!("Moving averages for {}", d.symbol),
        AxisKind::Time,
        "time",
        "price",
    );
    chart.series.push(SeriesSpec::over_time("close", SeriesKind::Line, &xs, &d.close));
    chart.series.push(SeriesSpec::over_time("MA50", SeriesKind::Line, &xs, &d.ma_short));
    chart.series.push(SeriesSpec::over_time("MA200", SeriesKind::Line, &xs, &d.ma_long));
    if d.ma_long.iter().all(|v| v.is_nan()) {
        chart
            .notes
            .push(format!("{}: not enough bars for MA200", d.symbol));
    }
    chart
}

fn macd_chart(d: &DerivedSeries) -> ChartSpec {
    let xs = time_axis(d);
    let mut chart = ChartSpec::new(format!("MACD for {}", d.symbol), AxisKind::Time, "time", "MACD");
    chart
        .series
        .push(SeriesSpec::over_time("MACD line", SeriesKind::Line, &xs, &d.macd.line));
    chart
        .series
        .push(SeriesSpec::over_time("MACD signal", SeriesKind::Line, &xs, &d.macd.signal));
    chart
}

fn distribution_chart(d: &DerivedSeries, bins: usize, density_points: usize) -> ChartSpec {
    let mut chart = ChartSpec::new(
        format!("Daily return distribution for {}", d.symbol),
        AxisKind::Value,
        "daily return",
        "density",
    );

    let hist = density_histogram(&d.returns, bins);
    chart.series.push(SeriesSpec::new(
        "density",
        SeriesKind::Bars,
        hist.iter().map(|b| (b.center(), b.density)).collect(),
    ));

    if let Some(fit) = NormalFit::fit(&d.returns) {
        let lo = d.returns.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = d.returns.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        chart.series.push(SeriesSpec::new(
            "normal fit",
            SeriesKind::Line,
            linspace(lo, hi, density_points)
                .into_iter()
                .map(|x| (x, fit.pdf(x)))
                .collect(),
        ));
    }

    chart.notes.push(match (mean(&d.returns), sample_std(&d.returns)) {
        (Some(m), Some(s)) => format!("{} - mean return: {m:.6}, risk: {s:.6}", d.symbol),
        _ => format!("{} - not enough bars for return statistics", d.symbol),
    });
    if let Some(first) = d.timestamps.first().filter(|_| !d.returns.is_empty()) {
        chart.notes.push(format!(
            "{} returns from {} closes; first bar {} has no return (charted elsewhere)",
            d.returns.len(),
            d.close.len(),
            first.date()
        ));
    }
    chart
}

fn risk_return_chart(derived: &[DerivedSeries]) -> ChartSpec {
    let mut chart = ChartSpec::new(
        "Risk vs expected daily return".into(),
        AxisKind::Value,
        "mean daily return",
        "daily risk",
    );
    for d in derived {
        match (mean(&d.returns), sample_std(&d.returns)) {
            (Some(m), Some(s)) => chart
                .series
                .push(SeriesSpec::new(d.symbol.clone(), SeriesKind::Scatter, vec![(m, s)])),
            _ => chart
                .notes
                .push(format!("{}: not enough bars for risk/return", d.symbol)),
        }
    }
    chart
}

fn volume_chart(d: &DerivedSeries) -> ChartSpec {
    let mut chart = ChartSpec::new(
        format!("Trading volume for {}", d.symbol),
        AxisKind::Time,
        "time",
        "volume",
    );
    chart.series.push(SeriesSpec::over_time(
        "volume",
        SeriesKind::Bars,
        &time_axis(d),
        &d.volume,
    ));
    chart
}
