//! Trigger monitoring: one pass over a bar series that runs the full
//! battery, the fusion and the level predictor, and settles on a call.

use crate::domain::combiner::{self, Direction, FusedDecision};
use crate::domain::error::TradefuseError;
use crate::domain::indicator::{self, IndicatorRow};
use crate::domain::levels::{self, DirectionPrediction};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::settings::EngineSettings;
use crate::domain::strategy::{self, StrategyKind, TechnicalSignal};

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerReport {
    /// The settled call; `None` means stay flat.
    pub signal: Option<Direction>,
    /// Fused indicator score plus the level predictor's score.
    pub combined_score: f64,
    pub fused: FusedDecision,
    pub prediction: DirectionPrediction,
    pub strategy_signals: Vec<TechnicalSignal>,
    pub indicators: IndicatorRow,
}

pub struct TriggerMonitor<'a> {
    settings: &'a EngineSettings,
}

impl<'a> TriggerMonitor<'a> {
    pub fn new(settings: &'a EngineSettings) -> Self {
        TriggerMonitor { settings }
    }

    /// Evaluates one cycle. A series shorter than the configured minimum
    /// is an error, never a silent hold.
    pub fn run(
        &self,
        bars: &[OhlcvBar],
        benchmark: Option<&[OhlcvBar]>,
        strategies: &[StrategyKind],
    ) -> Result<TriggerReport, TradefuseError> {
        let table = indicator::compute(bars, benchmark, self.settings)?;
        let row = table.latest().ok_or_else(|| TradefuseError::InvalidInput {
            reason: "empty indicator table".into(),
        })?;

        let fused = combiner::fuse(bars, &table, self.settings);
        let prediction = levels::predict_direction_using_levels(bars, row.adx, self.settings)?;
        let strategy_signals = strategy::evaluate_all(strategies, bars, &table);

        // The summed score overrides the fused call at the extremes.
        let combined_score = fused.total_score + prediction.score;
        let signal = if combined_score >= 0.5 {
            Some(Direction::Buy)
        } else if combined_score <= 0.0 {
            Some(Direction::Sell)
        } else {
            fused.direction
        };

        Ok(TriggerReport {
            signal,
            combined_score,
            fused,
            prediction,
            strategy_signals,
            indicators: row,
        })
    }
}
