//! ADX (Average Directional Index).
//!
//! +DM/-DM from bar-to-bar high/low moves, rolling sums over `period`
//! divided by ATR give +DI/-DI, DX = 100 × |+DI − −DI| / (+DI + −DI),
//! ADX = rolling mean of DX. A zero DI sum leaves DX undefined (None).

use crate::domain::indicator::atr::atr;
use crate::domain::ohlcv::OhlcvBar;

pub fn adx(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    let n = bars.len();
    if period == 0 || n < 2 {
        return vec![None; n];
    }

    let mut plus_dm = vec![0.0; n];
    let mut minus_dm = vec![0.0; n];
    for i in 1..n {
        let up_move = bars[i].high - bars[i - 1].high;
        let down_move = bars[i - 1].low - bars[i].low;
        if up_move > down_move && up_move > 0.0 {
            plus_dm[i] = up_move;
        }
        if down_move > up_move && down_move > 0.0 {
            minus_dm[i] = down_move;
        }
    }

    let atr_col = atr(bars, period);

    let mut dx = vec![None; n];
    let mut plus_sum = 0.0;
    let mut minus_sum = 0.0;
    for i in 0..n {
        plus_sum += plus_dm[i];
        minus_sum += minus_dm[i];
        if i >= period {
            plus_sum -= plus_dm[i - period];
            minus_sum -= minus_dm[i - period];
        }
        if i + 1 < period {
            continue;
        }
        let Some(atr_val) = atr_col[i] else { continue };
        if atr_val == 0.0 {
            continue;
        }
        let plus_di = 100.0 * plus_sum / atr_val;
        let minus_di = 100.0 * minus_sum / atr_val;
        let di_sum = plus_di + minus_di;
        if di_sum == 0.0 {
            continue;
        }
        dx[i] = Some(100.0 * (plus_di - minus_di).abs() / di_sum);
    }

    // Rolling mean over the last `period` DX values; None if any is missing.
    let mut out = vec![None; n];
    for i in (period - 1)..n {
        let window = &dx[i + 1 - period..=i];
        if window.iter().all(Option::is_some) {
            let sum: f64 = window.iter().flatten().sum();
            out[i] = Some(sum / period as f64);
        }
    }

    out
}
