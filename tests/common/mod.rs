#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
pub use tradefuse::domain::ohlcv::OhlcvBar;

pub fn timestamp(hour: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + chrono::Duration::hours(hour as i64)
}

pub fn bar(symbol: &str, hour: usize, close: f64, volume: f64) -> OhlcvBar {
    OhlcvBar {
        symbol: symbol.to_string(),
        timestamp: timestamp(hour),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume,
    }
}

/// Monotone uptrend: every bar closes `step` higher than the last.
pub fn trending_bars(symbol: &str, count: usize, start: f64, step: f64) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| bar(symbol, i, start + i as f64 * step, 1_000.0))
        .collect()
}

/// Oscillating series around `base` with no directional drift.
pub fn ranging_bars(symbol: &str, count: usize, base: f64) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| bar(symbol, i, base + (i as f64 * 0.8).sin() * 2.0, 1_000.0))
        .collect()
}

/// A strong uptrend that flattens into a directionless zigzag halfway
/// through.
pub fn regime_swap_bars(symbol: &str, count: usize) -> Vec<OhlcvBar> {
    let half = count / 2;
    let peak = 100.0 + half as f64 * 2.0;
    (0..count)
        .map(|i| {
            let close = if i < half {
                100.0 + i as f64 * 2.0
            } else if (i - half) % 2 == 0 {
                peak + 1.5
            } else {
                peak - 1.5
            };
            bar(symbol, i, close, 1_000.0)
        })
        .collect()
}
