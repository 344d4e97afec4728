//! Daily simple returns: close[t] / close[t-1] - 1.

/// Returns of a close series. The first observation has no return, so the
/// output has length `len - 1` (empty for fewer than two values).
pub fn simple_returns(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn ten_percent_up_then_down() {
        let r = simple_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert_approx(r[0], 0.10, DEFAULT_EPSILON);
        assert_approx(r[1], -0.10, DEFAULT_EPSILON);
    }

    #[test]
    fn short_series_have_no_returns() {
        assert!(simple_returns(&[]).is_empty());
        assert!(simple_returns(&[42.0]).is_empty());
    }
}
