//! Donchian channel: rolling max high and min low over the trailing window.

use crate::domain::ohlcv::OhlcvBar;

pub struct DonchianColumns {
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

pub fn donchian(bars: &[OhlcvBar], period: usize) -> DonchianColumns {
    let n = bars.len();
    let mut upper = vec![None; n];
    let mut lower = vec![None; n];

    if period == 0 {
        return DonchianColumns { upper, lower };
    }

    for i in (period.saturating_sub(1))..n {
        let window = &bars[i + 1 - period..=i];
        upper[i] = Some(window.iter().map(|b| b.high).fold(f64::MIN, f64::max));
        lower[i] = Some(window.iter().map(|b| b.low).fold(f64::MAX, f64::min));
    }

    DonchianColumns { upper, lower }
}
