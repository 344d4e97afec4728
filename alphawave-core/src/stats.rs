//! Descriptive statistics for the analysis panels.
//!
//! Plain functions over `f64` slices. Degenerate inputs (too few points, zero
//! variance) return `None` rather than NaN so callers can show "not enough
//! data" instead of drawing garbage.

use serde::{Deserialize, Serialize};

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Standard deviation with `ddof` delta degrees of freedom
/// (0 = population, 1 = sample).
pub fn std_dev(values: &[f64], ddof: usize) -> Option<f64> {
    if values.len() <= ddof {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - ddof) as f64).sqrt())
}

/// Sample standard deviation (ddof = 1), the printed "risk" figure.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    std_dev(values, 1)
}

/// Pearson correlation of two equal-length series.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx.sqrt() * syy.sqrt()))
}

/// Ordinary least squares fit `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation of the inputs.
    pub r: f64,
}

impl LinearFit {
    pub fn fit(x: &[f64], y: &[f64]) -> Option<Self> {
        let r = pearson(x, y)?;
        let mx = mean(x)?;
        let my = mean(y)?;
        let sxy: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
        let sxx: f64 = x.iter().map(|a| (a - mx).powi(2)).sum();
        let slope = sxy / sxx;
        Some(Self {
            slope,
            intercept: my - slope * mx,
            r,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Normal distribution fitted by maximum likelihood (population std).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalFit {
    pub mean: f64,
    pub std: f64,
}

impl NormalFit {
    pub fn fit(values: &[f64]) -> Option<Self> {
        let mean = mean(values)?;
        let std = std_dev(values, 0)?;
        if std == 0.0 || !std.is_finite() {
            return None;
        }
        Some(Self { mean, std })
    }

    pub fn pdf(&self, x: f64) -> f64 {
        let z = (x - self.mean) / self.std;
        (-0.5 * z * z).exp() / (self.std * (2.0 * std::f64::consts::PI).sqrt())
    }
}

/// `n` evenly spaced points from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// One histogram bin: `[left, right)`, the last bin closed on the right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub left: f64,
    pub right: f64,
    pub count: usize,
    /// count / (total * width), so the bars integrate to 1.
    pub density: f64,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.left + self.right) / 2.0
    }
}

/// Density-normalised histogram with `bins` equal-width bins over the data range.
pub fn density_histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (min, max) = if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    let width = (max - min) / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in &finite {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let total = finite.len() as f64;
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            left: min + width * i as f64,
            right: min + width * (i + 1) as f64,
            count,
            density: count as f64 / (total * width),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn mean_and_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        approx(mean(&v).unwrap(), 5.0);
        approx(std_dev(&v, 0).unwrap(), 2.0);
        approx(sample_std(&v).unwrap(), (32.0f64 / 7.0).sqrt());
        assert!(sample_std(&[1.0]).is_none());
        assert!(mean(&[]).is_none());
    }

    #[test]
    fn pearson_perfect_and_inverse() {
        let x = [1.0, 2.0, 3.0, 4.0];
        approx(pearson(&x, &[2.0, 4.0, 6.0, 8.0]).unwrap(), 1.0);
        approx(pearson(&x, &[8.0, 6.0, 4.0, 2.0]).unwrap(), -1.0);
        assert!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]).is_none());
        assert!(pearson(&x, &[1.0]).is_none());
    }

    #[test]
    fn ols_recovers_line() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v + 1.0).collect();
        let fit = LinearFit::fit(&x, &y).unwrap();
        approx(fit.slope, 3.0);
        approx(fit.intercept, 1.0);
        approx(fit.predict(10.0), 31.0);
    }

    #[test]
    fn normal_fit_uses_population_std() {
        let fit = NormalFit::fit(&[-1.0, 1.0]).unwrap();
        approx(fit.mean, 0.0);
        approx(fit.std, 1.0);
        approx(fit.pdf(0.0), 1.0 / (2.0 * std::f64::consts::PI).sqrt());
        assert!(NormalFit::fit(&[0.5, 0.5]).is_none());
    }

    #[test]
    fn linspace_endpoints() {
        let xs = linspace(-1.0, 1.0, 5);
        assert_eq!(xs, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn histogram_density_integrates_to_one() {
        let values: Vec<f64> = (0..100).map(|i| (i as f64 * 0.37).sin()).collect();
        let bins = density_histogram(&values, 12);
        assert_eq!(bins.len(), 12);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 100);
        let area: f64 = bins.iter().map(|b| b.density * (b.right - b.left)).sum();
        approx(area, 1.0);
    }

    #[test]
    fn histogram_of_constant_series() {
        let bins = density_histogram(&[0.0, 0.0, 0.0], 4);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
    }
}
