//! ATR (Average True Range): simple rolling mean of the true range.
//!
//! The first bar's true range is high - low (no previous close).
//! Warmup: first (period - 1) bars are None.

use crate::domain::ohlcv::OhlcvBar;

pub fn true_ranges(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

pub fn atr(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    let n = bars.len();
    if period == 0 {
        return vec![None; n];
    }

    let tr = true_ranges(bars);
    let mut out = vec![None; n];
    let mut window_sum = 0.0;

    for i in 0..n {
        window_sum += tr[i];
        if i >= period {
            window_sum -= tr[i - period];
        }
        if i + 1 >= period {
            out[i] = Some(window_sum / period as f64);
        }
    }

    out
}
