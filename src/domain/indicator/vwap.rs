//! VWAP: cumulative volume-weighted average of the typical price.
//!
//! Defined from the first bar with nonzero cumulative volume.

use crate::domain::ohlcv::OhlcvBar;

pub fn vwap(bars: &[OhlcvBar]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(bars.len());
    let mut pv_sum = 0.0;
    let mut vol_sum = 0.0;

    for bar in bars {
        pv_sum += bar.typical_price() * bar.volume;
        vol_sum += bar.volume;
        out.push(if vol_sum > 0.0 {
            Some(pv_sum / vol_sum)
        } else {
            None
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_bar(i: usize, price: f64, volume: f64) -> OhlcvBar {
        OhlcvBar {
            symbol: "BTC".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                + chrono::Duration::hours(i as i64),
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
        }
    }

    #[test]
    fn vwap_single_price() {
        let bars = vec![make_bar(0, 100.0, 10.0), make_bar(1, 100.0, 20.0)];
        let out = vwap(&bars);
        assert_relative_eq!(out[1].unwrap(), 100.0);
    }

    #[test]
    fn vwap_weights_by_volume() {
        let bars = vec![make_bar(0, 100.0, 10.0), make_bar(1, 200.0, 30.0)];
        let out = vwap(&bars);
        // (100*10 + 200*30) / 40 = 175
        assert_relative_eq!(out[1].unwrap(), 175.0);
    }

    #[test]
    fn vwap_zero_volume_prefix_is_undefined() {
        let bars = vec![make_bar(0, 100.0, 0.0), make_bar(1, 100.0, 10.0)];
        let out = vwap(&bars);
        assert!(out[0].is_none());
        assert!(out[1].is_some());
    }
}
