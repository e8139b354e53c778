//! Rate of change and relative strength vs. a benchmark series.

/// Percentage change over `period` bars. None during warmup or when the
/// reference value is zero.
pub fn roc(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut out = vec![None; n];
    if period == 0 {
        return out;
    }

    for i in period..n {
        let base = values[i - period];
        if base != 0.0 {
            out[i] = Some((values[i] - base) / base * 100.0);
        }
    }

    out
}

/// Relative strength: the instrument's ROC minus the benchmark's ROC over
/// the same window, in percentage points. The two series must be aligned
/// bar-for-bar; a length mismatch leaves the whole column undefined.
pub fn relative_strength(
    closes: &[f64],
    benchmark_closes: &[f64],
    period: usize,
) -> Vec<Option<f64>> {
    if closes.len() != benchmark_closes.len() {
        return vec![None; closes.len()];
    }

    let own = roc(closes, period);
    let bench = roc(benchmark_closes, period);
    own.into_iter()
        .zip(bench)
        .map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => Some(a - b),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn roc_basic() {
        let out = roc(&[100.0, 110.0, 121.0], 1);
        assert!(out[0].is_none());
        assert_relative_eq!(out[1].unwrap(), 10.0);
        assert_relative_eq!(out[2].unwrap(), 10.0);
    }

    #[test]
    fn roc_zero_base_is_undefined() {
        let out = roc(&[0.0, 10.0], 1);
        assert!(out[1].is_none());
    }

    #[test]
    fn roc_longer_period() {
        let out = roc(&[100.0, 105.0, 110.0, 120.0], 3);
        assert!(out[2].is_none());
        assert_relative_eq!(out[3].unwrap(), 20.0);
    }

    #[test]
    fn relative_strength_outperformance() {
        let closes = [100.0, 110.0];
        let bench = [100.0, 105.0];
        let out = relative_strength(&closes, &bench, 1);
        assert_relative_eq!(out[1].unwrap(), 5.0);
    }

    #[test]
    fn relative_strength_length_mismatch() {
        let out = relative_strength(&[100.0, 110.0], &[100.0], 1);
        assert!(out.iter().all(Option::is_none));
    }
}
