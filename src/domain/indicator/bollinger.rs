//! Bollinger Bands: SMA middle band ± multiplier × sample standard deviation.
//!
//! Warmup: first (period - 1) bars are None.

pub struct BollingerColumns {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

pub fn bollinger(closes: &[f64], period: usize, multiplier: f64) -> BollingerColumns {
    let n = closes.len();
    let mut upper = vec![None; n];
    let mut middle = vec![None; n];
    let mut lower = vec![None; n];

    if period < 2 {
        return BollingerColumns {
            upper,
            middle,
            lower,
        };
    }

    for i in (period - 1)..n {
        let window = &closes[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window
            .iter()
            .map(|v| {
                let d = v - mean;
                d * d
            })
            .sum::<f64>()
            / (period - 1) as f64;
        let stddev = variance.sqrt();

        middle[i] = Some(mean);
        upper[i] = Some(mean + multiplier * stddev);
        lower[i] = Some(mean - multiplier * stddev);
    }

    BollingerColumns {
        upper,
        middle,
        lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bollinger_warmup() {
        let closes = [10.0, 20.0, 30.0, 40.0, 50.0];
        let cols = bollinger(&closes, 3, 2.0);
        assert!(cols.middle[0].is_none());
        assert!(cols.middle[1].is_none());
        assert!(cols.middle[2].is_some());
    }

    #[test]
    fn bollinger_constant_series_collapses() {
        let closes = [100.0; 5];
        let cols = bollinger(&closes, 3, 2.0);
        assert_relative_eq!(cols.upper[4].unwrap(), 100.0);
        assert_relative_eq!(cols.middle[4].unwrap(), 100.0);
        assert_relative_eq!(cols.lower[4].unwrap(), 100.0);
    }

    #[test]
    fn bollinger_band_ordering() {
        let closes = [10.0, 12.0, 11.0, 13.0, 15.0, 14.0];
        let cols = bollinger(&closes, 3, 2.0);
        for i in 2..closes.len() {
            let (u, m, l) = (
                cols.upper[i].unwrap(),
                cols.middle[i].unwrap(),
                cols.lower[i].unwrap(),
            );
            assert!(u >= m && m >= l);
        }
    }

    #[test]
    fn bollinger_known_window() {
        let closes = [10.0, 20.0, 30.0];
        let cols = bollinger(&closes, 3, 2.0);
        // mean 20, sample stddev 10
        assert_relative_eq!(cols.middle[2].unwrap(), 20.0);
        assert_relative_eq!(cols.upper[2].unwrap(), 40.0);
        assert_relative_eq!(cols.lower[2].unwrap(), 0.0);
    }
}
