//! Simple and exponential moving averages.
//!
//! SMA: trailing mean over `period` bars; first `period - 1` outputs are None.
//! EMA: recursive smoothing with k = 2 / (period + 1), seeded from the first
//! value, so it is defined from bar 0 (matching the usual span-based EMA).

pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut window_sum = 0.0;

    for (i, &v) in values.iter().enumerate() {
        window_sum += v;
        if i >= period {
            window_sum -= values[i - period];
        }
        if i + 1 >= period {
            out.push(Some(window_sum / period as f64));
        } else {
            out.push(None);
        }
    }

    out
}

pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    if values.is_empty() || period == 0 {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut current = values[0];
    out.push(current);

    for &v in &values[1..] {
        current = v * k + current * (1.0 - k);
        out.push(current);
    }

    out
}
