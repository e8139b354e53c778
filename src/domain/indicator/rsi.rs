//! RSI (Relative Strength Index) via a simple rolling mean of gains/losses.
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss) over the trailing window.
//! The first `period` bars are None (a window of `period` price changes is
//! needed). A zero average loss makes RS undefined, so the output is None
//! rather than the conventional saturation at 100.

pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || closes.len() < 2 {
        return vec![None; closes.len()];
    }

    let mut gains = Vec::with_capacity(closes.len() - 1);
    let mut losses = Vec::with_capacity(closes.len() - 1);
    for w in closes.windows(2) {
        let change = w[1] - w[0];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let mut out = vec![None; closes.len()];
    for i in period..closes.len() {
        let start = i - period;
        let avg_gain: f64 = gains[start..i].iter().sum::<f64>() / period as f64;
        let avg_loss: f64 = losses[start..i].iter().sum::<f64>() / period as f64;

        out[i] = if avg_loss == 0.0 {
            None
        } else {
            let rs = avg_gain / avg_loss;
            Some(100.0 - 100.0 / (1.0 + rs))
        };
    }

    out
}
