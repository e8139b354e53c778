//! Stochastic oscillator.
//!
//! %K = 100 × (close − lowest low) / (highest high − lowest low) over
//! `k_period` bars, then %D = SMA(%K, d_period). A flat window (zero
//! high-low range) leaves %K undefined.

use crate::domain::ohlcv::OhlcvBar;

pub struct StochasticColumns {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

pub fn stochastic(bars: &[OhlcvBar], k_period: usize, d_period: usize) -> StochasticColumns {
    let n = bars.len();
    let mut k = vec![None; n];

    if k_period == 0 || d_period == 0 {
        return StochasticColumns { k, d: vec![None; n] };
    }

    for i in (k_period - 1)..n {
        let window = &bars[i + 1 - k_period..=i];
        let highest = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let lowest = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        let range = highest - lowest;
        if range > 0.0 {
            k[i] = Some(100.0 * (bars[i].close - lowest) / range);
        }
    }

    // %D: SMA over the last d_period defined %K values.
    let mut d = vec![None; n];
    for i in 0..n {
        if i + 1 < d_period {
            continue;
        }
        let window = &k[i + 1 - d_period..=i];
        if window.iter().all(Option::is_some) {
            let sum: f64 = window.iter().flatten().sum();
            d[i] = Some(sum / d_period as f64);
        }
    }

    StochasticColumns { k, d }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_bar(i: usize, high: f64, low: f64, close: f64) -> OhlcvBar {
        OhlcvBar {
            symbol: "BTC".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                + chrono::Duration::hours(i as i64),
            open: close,
            high,
            low,
            close,
            volume: 1_000.0,
        }
    }

    #[test]
    fn stochastic_close_at_high_is_hundred() {
        let bars: Vec<OhlcvBar> = (0..5).map(|i| make_bar(i, 110.0, 90.0, 110.0)).collect();
        let cols = stochastic(&bars, 3, 3);
        assert_relative_eq!(cols.k[4].unwrap(), 100.0);
    }

    #[test]
    fn stochastic_close_at_low_is_zero() {
        let bars: Vec<OhlcvBar> = (0..5).map(|i| make_bar(i, 110.0, 90.0, 90.0)).collect();
        let cols = stochastic(&bars, 3, 3);
        assert_relative_eq!(cols.k[4].unwrap(), 0.0);
    }

    #[test]
    fn stochastic_flat_window_is_undefined() {
        let bars: Vec<OhlcvBar> = (0..5).map(|i| make_bar(i, 100.0, 100.0, 100.0)).collect();
        let cols = stochastic(&bars, 3, 3);
        assert!(cols.k.iter().all(Option::is_none));
        assert!(cols.d.iter().all(Option::is_none));
    }

    #[test]
    fn stochastic_d_is_mean_of_k() {
        let bars: Vec<OhlcvBar> = (0..8)
            .map(|i| make_bar(i, 110.0, 90.0, 95.0 + i as f64))
            .collect();
        let cols = stochastic(&bars, 3, 3);
        let expected = (cols.k[5].unwrap() + cols.k[6].unwrap() + cols.k[7].unwrap()) / 3.0;
        assert_relative_eq!(cols.d[7].unwrap(), expected);
    }
}
