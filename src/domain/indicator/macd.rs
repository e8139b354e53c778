//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Warmup: the line is reported from bar (slow - 1), the signal and
//! histogram from bar (slow - 1 + signal - 1).

use crate::domain::indicator::moving_average::ema;

pub struct MacdColumns {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdColumns {
    let n = closes.len();
    if n == 0 || fast == 0 || slow == 0 || signal_period == 0 {
        return MacdColumns {
            line: vec![None; n],
            signal: vec![None; n],
            histogram: vec![None; n],
        };
    }

    let ema_fast = ema(closes, fast);
    let ema_slow = ema(closes, slow);
    let raw_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let raw_signal = ema(&raw_line, signal_period);

    let line_warmup = slow.saturating_sub(1);
    let signal_warmup = line_warmup + signal_period.saturating_sub(1);

    let mut line = vec![None; n];
    let mut signal = vec![None; n];
    let mut histogram = vec![None; n];
    for i in 0..n {
        if i >= line_warmup {
            line[i] = Some(raw_line[i]);
        }
        if i >= signal_warmup {
            signal[i] = Some(raw_signal[i]);
            histogram[i] = Some(raw_line[i] - raw_signal[i]);
        }
    }

    MacdColumns {
        line,
        signal,
        histogram,
    }
}
