//! Engine settings: every tunable threshold used by the signal and
//! execution logic, with INI overrides behind [`ConfigPort`].
//!
//! The defaults mirror common technical-analysis conventions (RSI 70/30,
//! ADX 25) and exchange rules (minimum order amount). They are settings,
//! not constants: the fusion and execution algorithms never hard-code them.

use crate::domain::error::TradefuseError;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Minimum bars required before any indicator computation (longest window).
    pub min_bars: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    /// MACD crossover sensitivity, scaled by ATR.
    pub macd_tolerance: f64,
    /// ADX level above which the market counts as trending.
    pub adx_trend_threshold: f64,
    /// Minimum order amount in quote currency units.
    pub min_order_amount: f64,
    /// Current volume must exceed the rolling average by this multiplier
    /// to count as a volume spike.
    pub volume_spike_threshold: f64,
    /// Regression slope magnitude below which the trend is neutral.
    pub slope_threshold: f64,
    /// Volatility-breakout factor for the target price (prev range × k).
    pub target_k: f64,
    /// Window for pivot levels and the regression fit.
    pub lookback_period: usize,
    pub quote_currency: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            min_bars: 120,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            macd_tolerance: 0.01,
            adx_trend_threshold: 25.0,
            min_order_amount: 5_000.0,
            volume_spike_threshold: 1.2,
            slope_threshold: 0.001,
            target_k: 0.5,
            lookback_period: 20,
            quote_currency: "KRW".into(),
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradefuseError> {
        let defaults = EngineSettings::default();
        let settings = EngineSettings {
            min_bars: config.get_int("engine", "min_bars", defaults.min_bars as i64) as usize,
            rsi_overbought: config.get_double("engine", "rsi_overbought", defaults.rsi_overbought),
            rsi_oversold: config.get_double("engine", "rsi_oversold", defaults.rsi_oversold),
            macd_tolerance: config.get_double("engine", "macd_tolerance", defaults.macd_tolerance),
            adx_trend_threshold: config.get_double(
                "engine",
                "adx_trend_threshold",
                defaults.adx_trend_threshold,
            ),
            min_order_amount: config.get_double(
                "executor",
                "min_order_amount",
                defaults.min_order_amount,
            ),
            volume_spike_threshold: config.get_double(
                "engine",
                "volume_spike_threshold",
                defaults.volume_spike_threshold,
            ),
            slope_threshold: config.get_double("engine", "slope_threshold", defaults.slope_threshold),
            target_k: config.get_double("engine", "target_k", defaults.target_k),
            lookback_period: config.get_int(
                "engine",
                "lookback_period",
                defaults.lookback_period as i64,
            ) as usize,
            quote_currency: config
                .get_string("executor", "quote_currency")
                .unwrap_or(defaults.quote_currency),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), TradefuseError> {
        if self.min_bars == 0 {
            return Err(invalid("engine", "min_bars", "must be positive"));
        }
        if self.lookback_period == 0 {
            return Err(invalid("engine", "lookback_period", "must be positive"));
        }
        if self.lookback_period > self.min_bars {
            return Err(invalid(
                "engine",
                "lookback_period",
                "must not exceed min_bars",
            ));
        }
        if self.rsi_oversold >= self.rsi_overbought {
            return Err(invalid(
                "engine",
                "rsi_oversold",
                "must be below rsi_overbought",
            ));
        }
        if !(0.0..=100.0).contains(&self.rsi_overbought)
            || !(0.0..=100.0).contains(&self.rsi_oversold)
        {
            return Err(invalid("engine", "rsi_overbought", "must be within 0..100"));
        }
        if self.min_order_amount <= 0.0 {
            return Err(invalid("executor", "min_order_amount", "must be positive"));
        }
        if self.volume_spike_threshold <= 0.0 {
            return Err(invalid(
                "engine",
                "volume_spike_threshold",
                "must be positive",
            ));
        }
        if self.adx_trend_threshold <= 0.0 {
            return Err(invalid("engine", "adx_trend_threshold", "must be positive"));
        }
        Ok(())
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> TradefuseError {
    TradefuseError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: reason.into(),
    }
}
