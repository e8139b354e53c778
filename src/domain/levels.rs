//! Support/resistance pivots and regression-trend direction prediction.

use crate::domain::combiner::Direction;
use crate::domain::error::TradefuseError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::settings::EngineSettings;

/// Classic floor-trader pivots over a rolling window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotLevels {
    pub pivot: f64,
    pub s1: f64,
    pub s2: f64,
    pub r1: f64,
    pub r2: f64,
}

/// OLS fit over the close series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionTrend {
    pub slope: f64,
    pub r_squared: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionPrediction {
    pub current_price: f64,
    /// Name of the nearest level ("to_s1", "to_r2", "to_pivot", ...).
    pub closest_level: String,
    pub closest_value: f64,
    /// `None` means hold.
    pub prediction: Option<Direction>,
    pub confidence: f64,
    pub volume_spike: bool,
    pub opinions: Vec<String>,
    pub score: f64,
}

/// Pivot point and two support/resistance bands from the trailing
/// `lookback` bars: H is the window high, L the window low, C the last
/// close.
pub fn support_resistance_pivots(
    bars: &[OhlcvBar],
    lookback: usize,
) -> Result<PivotLevels, TradefuseError> {
    if lookback == 0 || bars.len() < lookback {
        let symbol = bars.first().map(|b| b.symbol.clone()).unwrap_or_default();
        return Err(TradefuseError::InsufficientData {
            symbol,
            bars: bars.len(),
            minimum: lookback,
        });
    }

    let window = &bars[bars.len() - lookback..];
    let high = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let low = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let close = window[window.len() - 1].close;

    if high.is_nan() || low.is_nan() || close.is_nan() {
        return Err(TradefuseError::InvalidInput {
            reason: "window contains NaN prices".into(),
        });
    }

    let pivot = (high + low + close) / 3.0;
    let range = high - low;
    Ok(PivotLevels {
        pivot,
        s1: 2.0 * pivot - high,
        r1: 2.0 * pivot - low,
        s2: pivot - range,
        r2: pivot + range,
    })
}

/// Least-squares line over the closes: slope per bar and R².
pub fn regression_trend(closes: &[f64]) -> Option<RegressionTrend> {
    let n = closes.len();
    if n < 2 {
        return None;
    }

    let nf = n as f64;
    let x_mean = (nf - 1.0) / 2.0;
    let y_mean = closes.iter().sum::<f64>() / nf;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, &y) in closes.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (i, &y) in closes.iter().enumerate() {
        let fitted = intercept + slope * i as f64;
        ss_res += (y - fitted) * (y - fitted);
        ss_tot += (y - y_mean) * (y - y_mean);
    }
    let r_squared = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        0.0
    };

    Some(RegressionTrend { slope, r_squared })
}

struct LevelVote {
    direction: Option<Direction>,
    confidence: f64,
    opinion: String,
}

fn closest_level(price: f64, levels: &PivotLevels) -> (&'static str, f64) {
    let candidates = [
        ("to_s1", levels.s1),
        ("to_s2", levels.s2),
        ("to_r1", levels.r1),
        ("to_r2", levels.r2),
        ("to_pivot", levels.pivot),
    ];
    let mut best = candidates[0];
    for candidate in &candidates[1..] {
        if (price - candidate.1).abs() < (price - best.1).abs() {
            best = *candidate;
        }
    }
    best
}

fn support_resistance_vote(price: f64, levels: &PivotLevels, volume_spike: bool) -> LevelVote {
    let (name, value) = closest_level(price, levels);
    let mut opinion = format!("Price({price:.2}) is near {name}({value:.2})");

    let near_support = name.starts_with("to_s") && price >= value;
    let near_resistance = name.starts_with("to_r") && price <= value;

    if near_support {
        let mut confidence = 0.7;
        opinion.push_str("; bounce off support is likely.");
        if volume_spike {
            confidence += 0.1;
            opinion.push_str(" Rising volume lifts confidence.");
        }
        if price < levels.pivot {
            confidence -= 0.1;
            opinion.push_str(" Below the pivot lowers confidence.");
        }
        LevelVote {
            direction: Some(Direction::Buy),
            confidence,
            opinion,
        }
    } else if near_resistance {
        let mut confidence = 0.7;
        opinion.push_str("; rejection at resistance is likely.");
        if volume_spike {
            confidence += 0.1;
            opinion.push_str(" Rising volume lifts confidence.");
        }
        if price > levels.pivot {
            confidence -= 0.1;
            opinion.push_str(" Above the pivot lowers confidence.");
        }
        LevelVote {
            direction: Some(Direction::Sell),
            confidence,
            opinion,
        }
    } else if price < levels.s1 {
        let confidence = if volume_spike { 0.8 } else { 0.6 };
        opinion.push_str(&format!("; broke below S1({:.2}).", levels.s1));
        if volume_spike {
            opinion.push_str(" Volume surge makes this a strong signal.");
        }
        LevelVote {
            direction: Some(Direction::Sell),
            confidence,
            opinion,
        }
    } else if price > levels.r1 {
        let confidence = if volume_spike { 0.8 } else { 0.6 };
        opinion.push_str(&format!("; broke above R1({:.2}).", levels.r1));
        if volume_spike {
            opinion.push_str(" Volume surge makes this a strong signal.");
        }
        LevelVote {
            direction: Some(Direction::Buy),
            confidence,
            opinion,
        }
    } else {
        opinion.push('.');
        LevelVote {
            direction: None,
            confidence: 0.5,
            opinion,
        }
    }
}

fn regression_vote(closes: &[f64], slope_threshold: f64) -> LevelVote {
    let Some(trend) = regression_trend(closes) else {
        return LevelVote {
            direction: None,
            confidence: 0.0,
            opinion: "Too little data for a regression fit.".into(),
        };
    };

    let RegressionTrend { slope, r_squared } = trend;
    if slope.abs() < slope_threshold {
        return LevelVote {
            direction: None,
            confidence: r_squared,
            opinion: format!("Regression trend neutral (slope {slope:.4}, R2 {r_squared:.4})."),
        };
    }

    let confidence = (0.7 + slope.abs() * 0.1).min(0.9) * r_squared;
    if slope > 0.0 {
        LevelVote {
            direction: Some(Direction::Buy),
            confidence,
            opinion: format!("Regression trend upward (slope {slope:.4}, R2 {r_squared:.4})."),
        }
    } else {
        LevelVote {
            direction: Some(Direction::Sell),
            confidence,
            opinion: format!("Regression trend downward (slope {slope:.4}, R2 {r_squared:.4})."),
        }
    }
}

/// Fuses the pivot-level vote and the regression vote into a direction
/// prediction for the latest bar.
pub fn predict_direction_using_levels(
    bars: &[OhlcvBar],
    adx: Option<f64>,
    settings: &EngineSettings,
) -> Result<DirectionPrediction, TradefuseError> {
    let lookback = settings.lookback_period;
    if bars.len() < lookback {
        let symbol = bars.first().map(|b| b.symbol.clone()).unwrap_or_default();
        return Err(TradefuseError::InsufficientData {
            symbol,
            bars: bars.len(),
            minimum: lookback,
        });
    }

    let current_price = bars[bars.len() - 1].close;
    if current_price.is_nan() {
        return Err(TradefuseError::InvalidInput {
            reason: "current price is NaN".into(),
        });
    }

    let levels = support_resistance_pivots(bars, lookback)?;

    // Average volume over the window excluding the latest bar.
    let window = &bars[bars.len() - lookback..bars.len() - 1];
    let volume_spike = if window.is_empty() {
        false
    } else {
        let avg = window.iter().map(|b| b.volume).sum::<f64>() / window.len() as f64;
        bars[bars.len() - 1].volume > avg * settings.volume_spike_threshold
    };

    let sr = support_resistance_vote(current_price, &levels, volume_spike);
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let lr = regression_vote(&closes, settings.slope_threshold);

    let weight = if adx.is_some_and(|a| a > settings.adx_trend_threshold) {
        0.4
    } else {
        0.3
    };
    let total_weight = weight * 2.0;
    let mut score = 0.0;
    for vote in [&sr, &lr] {
        let value = vote.direction.map_or(0.0, |d| match d {
            Direction::Buy => 1.0,
            Direction::Sell => -1.0,
        });
        score += weight / total_weight * value;
    }

    let prediction = if score > 0.0 {
        Some(Direction::Buy)
    } else if score < 0.0 {
        Some(Direction::Sell)
    } else {
        None
    };

    let confidence = match prediction {
        Some(winner) => {
            let mut agreeing_weight = 0.0;
            let mut weighted_conf = 0.0;
            for vote in [&sr, &lr] {
                if vote.direction == Some(winner) {
                    weighted_conf += weight * vote.confidence;
                    agreeing_weight += weight;
                }
            }
            if agreeing_weight > 0.0 {
                weighted_conf / agreeing_weight
            } else {
                0.5
            }
        }
        None => 0.5,
    };

    let (closest_name, closest_value) = closest_level(current_price, &levels);
    Ok(DirectionPrediction {
        current_price,
        closest_level: closest_name.into(),
        closest_value,
        prediction,
        confidence: confidence.clamp(0.0, 1.0),
        volume_spike,
        opinions: vec![sr.opinion, lr.opinion],
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn make_bar(i: usize, high: f64, low: f64, close: f64, volume: f64) -> OhlcvBar {
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
            volume,
        }
    }

    fn flat_bars(count: usize, close: f64) -> Vec<OhlcvBar> {
        (0..count)
            .map(|i| make_bar(i, close + 5.0, close - 5.0, close, 1_000.0))
            .collect()
    }

    #[test]
    fn pivot_formulas() {
        // H=110, L=90, C=100 -> P=100, S1=90, R1=110, S2=80, R2=120
        let bars = vec![make_bar(0, 110.0, 90.0, 100.0, 1_000.0)];
        let levels = support_resistance_pivots(&bars, 1).unwrap();
        assert_relative_eq!(levels.pivot, 100.0);
        assert_relative_eq!(levels.s1, 90.0);
        assert_relative_eq!(levels.r1, 110.0);
        assert_relative_eq!(levels.s2, 80.0);
        assert_relative_eq!(levels.r2, 120.0);
    }

    #[test]
    fn pivots_reject_short_window() {
        let bars = flat_bars(3, 100.0);
        assert!(matches!(
            support_resistance_pivots(&bars, 5),
            Err(TradefuseError::InsufficientData { .. })
        ));
    }

    #[test]
    fn pivots_reject_nan() {
        let mut bars = flat_bars(5, 100.0);
        bars[4].close = f64::NAN;
        assert!(matches!(
            support_resistance_pivots(&bars, 5),
            Err(TradefuseError::InvalidInput { .. })
        ));
    }

    #[test]
    fn regression_recovers_line() {
        let closes: Vec<f64> = (0..50).map(|i| 10.0 + 2.0 * i as f64).collect();
        let trend = regression_trend(&closes).unwrap();
        assert_relative_eq!(trend.slope, 2.0, epsilon = 1e-9);
        assert_relative_eq!(trend.r_squared, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn regression_flat_series() {
        let closes = vec![5.0; 30];
        let trend = regression_trend(&closes).unwrap();
        assert_relative_eq!(trend.slope, 0.0, epsilon = 1e-12);
        assert_relative_eq!(trend.r_squared, 0.0);
    }

    #[test]
    fn regression_needs_two_points() {
        assert!(regression_trend(&[1.0]).is_none());
    }

    #[test]
    fn predict_rejects_short_series() {
        let bars = flat_bars(5, 100.0);
        let settings = EngineSettings::default();
        assert!(matches!(
            predict_direction_using_levels(&bars, None, &settings),
            Err(TradefuseError::InsufficientData { .. })
        ));
    }

    #[test]
    fn uptrend_predicts_buy() {
        let bars: Vec<OhlcvBar> = (0..30)
            .map(|i| {
                let close = 100.0 + i as f64 * 2.0;
                make_bar(i, close + 1.0, close - 1.0, close, 1_000.0)
            })
            .collect();
        let settings = EngineSettings::default();
        let prediction = predict_direction_using_levels(&bars, None, &settings).unwrap();
        assert_eq!(prediction.prediction, Some(Direction::Buy));
        assert!(prediction.score > 0.0);
        assert!(prediction.confidence > 0.5);
    }

    #[test]
    fn downtrend_predicts_sell() {
        let bars: Vec<OhlcvBar> = (0..30)
            .map(|i| {
                let close = 200.0 - i as f64 * 2.0;
                make_bar(i, close + 1.0, close - 1.0, close, 1_000.0)
            })
            .collect();
        let settings = EngineSettings::default();
        let prediction = predict_direction_using_levels(&bars, None, &settings).unwrap();
        assert_eq!(prediction.prediction, Some(Direction::Sell));
    }

    #[test]
    fn volume_spike_detected() {
        let mut bars = flat_bars(30, 100.0);
        let last = bars.len() - 1;
        bars[last].volume = 10_000.0;
        let settings = EngineSettings::default();
        let prediction = predict_direction_using_levels(&bars, None, &settings).unwrap();
        assert!(prediction.volume_spike);
    }

    proptest! {
        #[test]
        fn pivot_levels_are_ordered(
            low in 1.0f64..1000.0,
            spread in 0.1f64..100.0,
            frac in 0.0f64..1.0,
        ) {
            let high = low + spread;
            let close = low + spread * frac;
            let bars = vec![make_bar(0, high, low, close, 1_000.0)];
            let levels = support_resistance_pivots(&bars, 1).unwrap();
            prop_assert!(levels.s2 <= levels.s1);
            prop_assert!(levels.s1 <= levels.pivot);
            prop_assert!(levels.pivot <= levels.r1);
            prop_assert!(levels.r1 <= levels.r2);
        }
    }

    #[test]
    fn flat_market_holds_with_floor_confidence() {
        let bars = flat_bars(30, 100.0);
        let settings = EngineSettings::default();
        let prediction = predict_direction_using_levels(&bars, None, &settings).unwrap();
        // price sits exactly on the pivot; regression is flat
        assert_eq!(prediction.prediction, None);
        assert_relative_eq!(prediction.confidence, 0.5);
    }
}
