//! Regime-adaptive signal fusion.
//!
//! Each indicator casts a vote (direction, confidence, opinion). Votes are
//! combined under a weight table chosen by the ADX regime, shifted by a
//! base score from volatility-target buy/sell checks, and the winning
//! direction's confidence is the weighted average of the agreeing votes.
//! Indicators whose inputs are undefined are excluded from the vote set
//! and the confidence denominator rather than aborting the fusion.

use crate::domain::indicator::IndicatorTable;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::settings::EngineSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    fn score(self) -> f64 {
        match self {
            Direction::Buy => 1.0,
            Direction::Sell => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    Trending,
    Ranging,
}

impl Regime {
    pub fn classify(adx: Option<f64>, threshold: f64) -> Regime {
        match adx {
            Some(adx) if adx > threshold => Regime::Trending,
            _ => Regime::Ranging,
        }
    }
}

/// One indicator's contribution to the fusion.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorVote {
    pub name: &'static str,
    pub direction: Option<Direction>,
    pub confidence: f64,
    pub opinion: String,
}

/// The fused call. `direction` is `None` when the votes cancel out or no
/// indicator could vote at all.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedDecision {
    pub direction: Option<Direction>,
    pub confidence: f64,
    pub total_score: f64,
    pub regime: Regime,
    pub opinions: Vec<String>,
}

impl FusedDecision {
    fn empty(regime: Regime) -> FusedDecision {
        FusedDecision {
            direction: None,
            confidence: 0.0,
            total_score: 0.0,
            regime,
            opinions: vec!["Not enough indicators.".into()],
        }
    }
}

pub fn rsi_vote(rsi: f64, settings: &EngineSettings) -> IndicatorVote {
    let (direction, confidence, opinion) = if rsi >= settings.rsi_overbought {
        (
            Some(Direction::Sell),
            (0.8 + (rsi - settings.rsi_overbought) * 0.01).min(0.95),
            format!("RSI({rsi:.1}) is in the overbought zone."),
        )
    } else if rsi <= settings.rsi_oversold {
        (
            Some(Direction::Buy),
            (0.8 + (settings.rsi_oversold - rsi) * 0.01).min(0.95),
            format!("RSI({rsi:.1}) is in the oversold zone."),
        )
    } else {
        (None, 0.5, format!("RSI({rsi:.1}) is neutral."))
    };
    IndicatorVote {
        name: "rsi",
        direction,
        confidence,
        opinion,
    }
}

pub fn macd_vote(macd: f64, signal: f64, atr: f64, settings: &EngineSettings) -> IndicatorVote {
    let tolerance = settings.macd_tolerance * atr;
    let diff = macd - signal;
    let (direction, confidence, opinion) = if diff.abs() < tolerance {
        (
            None,
            0.5,
            format!("MACD({macd:.2}) and signal({signal:.2}) are neutral."),
        )
    } else if diff > 0.0 {
        (
            Some(Direction::Buy),
            (0.8 + diff * 0.1).min(0.9),
            "MACD crossed above its signal line.".into(),
        )
    } else {
        (
            Some(Direction::Sell),
            (0.8 - diff * 0.1).min(0.9),
            "MACD crossed below its signal line.".into(),
        )
    };
    IndicatorVote {
        name: "macd",
        direction,
        confidence,
        opinion,
    }
}

pub fn bollinger_vote(price: f64, upper: f64, lower: f64, prev_price: f64) -> IndicatorVote {
    let upper_diff = price - upper;
    let lower_diff = lower - price;
    let (direction, confidence, opinion) = if upper_diff >= 0.0 && price < prev_price {
        (
            Some(Direction::Sell),
            (0.7 + upper_diff * 0.05).min(0.9),
            format!("Price({price:.2}) pushed above the upper band({upper:.2}) and is fading."),
        )
    } else if lower_diff >= 0.0 && price > prev_price {
        (
            Some(Direction::Buy),
            (0.7 + lower_diff * 0.05).min(0.9),
            format!("Price({price:.2}) dipped below the lower band({lower:.2}) and is recovering."),
        )
    } else {
        (
            None,
            0.5,
            format!("Price({price:.2}) is neutral inside the bands."),
        )
    };
    IndicatorVote {
        name: "bollinger",
        direction,
        confidence,
        opinion,
    }
}

pub fn adx_trend_vote(
    adx: f64,
    short_ma: f64,
    long_ma: f64,
    settings: &EngineSettings,
) -> IndicatorVote {
    let threshold = settings.adx_trend_threshold;
    let (direction, confidence, opinion) = if short_ma > long_ma && adx > threshold {
        (
            Some(Direction::Buy),
            (0.8 + (adx - threshold) * 0.01).min(0.95),
            format!("ADX({adx:.1}) confirms a strong uptrend."),
        )
    } else if short_ma < long_ma && adx > threshold {
        (
            Some(Direction::Sell),
            (0.8 + (adx - threshold) * 0.01).min(0.95),
            format!("ADX({adx:.1}) confirms a strong downtrend."),
        )
    } else {
        (None, 0.5, format!("ADX({adx:.1}) shows a weak trend."))
    };
    IndicatorVote {
        name: "adx",
        direction,
        confidence,
        opinion,
    }
}

/// Target entry price from the prior bar's range (volatility breakout).
pub fn target_price(bars: &[OhlcvBar], k: f64) -> Option<f64> {
    let prev = bars.len().checked_sub(2).map(|i| &bars[i])?;
    Some(prev.close + (prev.high - prev.low) * k)
}

/// +0.5 when price sits in the buy window: at or above the target (less
/// half an ATR of slack), not overextended past it, and above the MA.
/// Without a target the MA alone decides.
pub fn buy_condition_score(
    target: Option<f64>,
    ma: f64,
    price: f64,
    high: Option<f64>,
    atr: Option<f64>,
) -> f64 {
    let (Some(target), Some(high)) = (target, high) else {
        return if price >= ma { 0.5 } else { 0.0 };
    };
    let volatility_factor = atr.map_or(0.0, |a| a * 0.5);
    if price >= target - volatility_factor && high <= target * 1.05 && price >= ma {
        0.5
    } else {
        0.0
    }
}

/// -0.5 when price has lost the MA, with an ATR-deep break counting even
/// when price is still marginally above it.
pub fn sell_condition_score(price: f64, ma: f64, atr: Option<f64>) -> f64 {
    if let Some(atr) = atr {
        if atr > 0.0 && price < ma - atr * 0.3 {
            return -0.5;
        }
    }
    if price < ma { -0.5 } else { 0.0 }
}

fn weight_for(regime: Regime, name: &str) -> f64 {
    match regime {
        Regime::Trending => match name {
            "macd" => 0.4,
            "adx" => 0.3,
            "rsi" => 0.2,
            "bollinger" => 0.1,
            _ => 0.0,
        },
        Regime::Ranging => match name {
            "rsi" => 0.4,
            "bollinger" => 0.4,
            "macd" => 0.2,
            _ => 0.0,
        },
    }
}

/// Weighted vote combination: normalized weights over the voting set,
/// shifted by the base score. Positive total means BUY, negative SELL.
fn combine(votes: &[IndicatorVote], regime: Regime, base_score: f64) -> (Option<Direction>, f64) {
    let total_weight: f64 = votes.iter().map(|v| weight_for(regime, v.name)).sum();
    if total_weight <= 0.0 {
        return (None, base_score);
    }

    let mut total_score = base_score;
    for vote in votes {
        let value = vote.direction.map_or(0.0, Direction::score);
        total_score += weight_for(regime, vote.name) / total_weight * value;
    }

    let direction = if total_score > 0.0 {
        Some(Direction::Buy)
    } else if total_score < 0.0 {
        Some(Direction::Sell)
    } else {
        None
    };
    (direction, total_score)
}

fn agreeing_confidence(votes: &[IndicatorVote], regime: Regime, winner: Direction) -> f64 {
    let mut total_weight = 0.0;
    let mut weighted_conf = 0.0;
    for vote in votes {
        if vote.direction == Some(winner) {
            let w = weight_for(regime, vote.name);
            weighted_conf += w * vote.confidence;
            total_weight += w;
        }
    }
    if total_weight > 0.0 {
        weighted_conf / total_weight
    } else {
        0.0
    }
}

/// Fuses the latest indicator row into a single call.
pub fn fuse(bars: &[OhlcvBar], table: &IndicatorTable, settings: &EngineSettings) -> FusedDecision {
    let Some(row) = table.latest() else {
        return FusedDecision::empty(Regime::Ranging);
    };
    let Some(bar) = bars.last() else {
        return FusedDecision::empty(Regime::Ranging);
    };
    let regime = Regime::classify(row.adx, settings.adx_trend_threshold);

    let mut votes = Vec::new();

    if let Some(rsi) = row.rsi {
        votes.push(rsi_vote(rsi, settings));
    }
    if let (Some(macd), Some(signal), Some(atr)) = (row.macd, row.macd_signal, row.atr) {
        votes.push(macd_vote(macd, signal, atr, settings));
    }
    if let (Some(upper), Some(lower), Some(prev)) = (
        row.bb_upper,
        row.bb_lower,
        bars.len().checked_sub(2).map(|i| bars[i].close),
    ) {
        votes.push(bollinger_vote(bar.close, upper, lower, prev));
    }
    if regime == Regime::Trending {
        if let (Some(adx), Some(short_ma), Some(long_ma)) = (row.adx, row.ma_short, row.ma_long) {
            votes.push(adx_trend_vote(adx, short_ma, long_ma, settings));
        }
    }

    if votes.is_empty() {
        return FusedDecision::empty(regime);
    }

    let base_score = match row.ma_short {
        Some(ma) => {
            let target = target_price(bars, settings.target_k);
            buy_condition_score(target, ma, bar.close, Some(bar.high), row.atr)
                + sell_condition_score(bar.close, ma, row.atr)
        }
        None => 0.0,
    };

    let (direction, total_score) = combine(&votes, regime, base_score);
    let confidence = match direction {
        Some(winner) => agreeing_confidence(&votes, regime, winner),
        None => 0.0,
    };

    FusedDecision {
        direction,
        confidence,
        total_score,
        regime,
        opinions: votes.into_iter().map(|v| v.opinion).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn settings() -> EngineSettings {
        EngineSettings::default()
    }

    #[test]
    fn rsi_overbought_sells() {
        let vote = rsi_vote(85.0, &settings());
        assert_eq!(vote.direction, Some(Direction::Sell));
        assert_relative_eq!(vote.confidence, 0.95);
    }

    #[test]
    fn rsi_oversold_buys() {
        let vote = rsi_vote(25.0, &settings());
        assert_eq!(vote.direction, Some(Direction::Buy));
        assert_relative_eq!(vote.confidence, 0.85);
    }

    #[test]
    fn rsi_neutral_band() {
        let vote = rsi_vote(50.0, &settings());
        assert_eq!(vote.direction, None);
        assert_relative_eq!(vote.confidence, 0.5);
    }

    #[test]
    fn macd_within_tolerance_is_neutral() {
        // tolerance = 0.01 * 10 = 0.1, diff = 0.05
        let vote = macd_vote(1.05, 1.0, 10.0, &settings());
        assert_eq!(vote.direction, None);
    }

    #[test]
    fn macd_cross_up_buys() {
        let vote = macd_vote(2.0, 1.0, 10.0, &settings());
        assert_eq!(vote.direction, Some(Direction::Buy));
        assert_relative_eq!(vote.confidence, 0.9);
    }

    #[test]
    fn bollinger_fade_above_upper_sells() {
        let vote = bollinger_vote(110.0, 108.0, 90.0, 111.0);
        assert_eq!(vote.direction, Some(Direction::Sell));
        assert_relative_eq!(vote.confidence, 0.8);
    }

    #[test]
    fn bollinger_recovery_below_lower_buys() {
        let vote = bollinger_vote(88.0, 110.0, 90.0, 87.0);
        assert_eq!(vote.direction, Some(Direction::Buy));
        assert_relative_eq!(vote.confidence, 0.8);
    }

    #[test]
    fn adx_trend_follows_ma_order() {
        let up = adx_trend_vote(40.0, 105.0, 100.0, &settings());
        assert_eq!(up.direction, Some(Direction::Buy));
        let down = adx_trend_vote(40.0, 95.0, 100.0, &settings());
        assert_eq!(down.direction, Some(Direction::Sell));
        let weak = adx_trend_vote(10.0, 105.0, 100.0, &settings());
        assert_eq!(weak.direction, None);
    }

    #[test]
    fn regime_classification() {
        assert_eq!(Regime::classify(Some(30.0), 25.0), Regime::Trending);
        assert_eq!(Regime::classify(Some(20.0), 25.0), Regime::Ranging);
        assert_eq!(Regime::classify(None, 25.0), Regime::Ranging);
    }

    #[test]
    fn buy_condition_without_target_uses_ma() {
        assert_relative_eq!(buy_condition_score(None, 100.0, 105.0, None, None), 0.5);
        assert_relative_eq!(buy_condition_score(None, 100.0, 95.0, None, None), 0.0);
    }

    #[test]
    fn sell_condition_atr_break() {
        // price above ma but below ma - atr*0.3 is impossible; deep break case:
        assert_relative_eq!(sell_condition_score(96.0, 100.0, Some(10.0)), -0.5);
        assert_relative_eq!(sell_condition_score(101.0, 100.0, Some(10.0)), 0.0);
        assert_relative_eq!(sell_condition_score(99.0, 100.0, None), -0.5);
    }

    #[test]
    fn combine_unanimous_buy() {
        let votes = vec![
            rsi_vote(25.0, &settings()),
            macd_vote(2.0, 1.0, 10.0, &settings()),
            bollinger_vote(88.0, 110.0, 90.0, 87.0),
        ];
        let (direction, score) = combine(&votes, Regime::Ranging, 0.0);
        assert_eq!(direction, Some(Direction::Buy));
        assert_relative_eq!(score, 1.0);
    }

    #[test]
    fn combine_applies_base_score() {
        let votes = vec![rsi_vote(50.0, &settings())];
        let (direction, score) = combine(&votes, Regime::Ranging, -0.5);
        assert_eq!(direction, Some(Direction::Sell));
        assert_relative_eq!(score, -0.5);
    }

    #[test]
    fn agreeing_confidence_ignores_dissenters() {
        let votes = vec![
            rsi_vote(25.0, &settings()),              // BUY 0.85
            macd_vote(-2.0, -1.0, 10.0, &settings()), // SELL
        ];
        let conf = agreeing_confidence(&votes, Regime::Ranging, Direction::Buy);
        assert_relative_eq!(conf, 0.85);
    }

    proptest! {
        #[test]
        fn vote_confidence_bounded(rsi in 0.0f64..100.0) {
            let vote = rsi_vote(rsi, &settings());
            prop_assert!((0.0..=1.0).contains(&vote.confidence));
        }

        #[test]
        fn combined_score_bounded(
            rsi in 0.0f64..100.0,
            macd in -5.0f64..5.0,
            signal in -5.0f64..5.0,
        ) {
            let votes = vec![
                rsi_vote(rsi, &settings()),
                macd_vote(macd, signal, 1.0, &settings()),
            ];
            let (_, score) = combine(&votes, Regime::Ranging, 0.0);
            prop_assert!((-1.0..=1.0).contains(&score));
        }
    }
}
