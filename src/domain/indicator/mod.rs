//! The indicator battery.
//!
//! [`compute`] takes a bar series and produces an [`IndicatorTable`]: one
//! column per indicator, aligned bar-for-bar with the input, with `None`
//! wherever a value is undefined (warmup, zero denominators, flat windows).
//! The table is immutable once built; downstream code reads rows out of it
//! but never writes back into it.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod donchian;
pub mod macd;
pub mod momentum;
pub mod moving_average;
pub mod rsi;
pub mod stochastic;
pub mod volume;
pub mod vwap;

use crate::domain::error::TradefuseError;
use crate::domain::ohlcv::{self, OhlcvBar};
use crate::domain::settings::EngineSettings;

pub const MA_SHORT_PERIOD: usize = 9;
pub const MA_MID_PERIOD: usize = 21;
pub const MA_LONG_PERIOD: usize = 120;
pub const RSI_PERIOD: usize = 14;
pub const RSI_FAST_PERIOD: usize = 5;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_MULTIPLIER: f64 = 2.0;
pub const ATR_PERIOD: usize = 14;
pub const ADX_PERIOD: usize = 14;
pub const STOCHASTIC_K_PERIOD: usize = 14;
pub const STOCHASTIC_D_PERIOD: usize = 3;
pub const DONCHIAN_PERIOD: usize = 20;
pub const VOLUME_PERIOD: usize = 20;
pub const ROC_SHORT_PERIOD: usize = 1;
pub const ROC_LONG_PERIOD: usize = 5;
pub const RELATIVE_STRENGTH_PERIOD: usize = 20;

/// Column store for the whole battery. Every column has the same length
/// as the bar series it was computed from.
#[derive(Debug, Clone)]
pub struct IndicatorTable {
    len: usize,
    pub ma_short: Vec<Option<f64>>,
    pub ma_mid: Vec<Option<f64>>,
    pub ma_long: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub rsi_fast: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub macd_signal: Vec<Option<f64>>,
    pub macd_histogram: Vec<Option<f64>>,
    pub bb_upper: Vec<Option<f64>>,
    pub bb_middle: Vec<Option<f64>>,
    pub bb_lower: Vec<Option<f64>>,
    pub atr: Vec<Option<f64>>,
    pub adx: Vec<Option<f64>>,
    pub stoch_k: Vec<Option<f64>>,
    pub stoch_d: Vec<Option<f64>>,
    pub donchian_upper: Vec<Option<f64>>,
    pub donchian_lower: Vec<Option<f64>>,
    pub vwap: Vec<Option<f64>>,
    pub roc_short: Vec<Option<f64>>,
    pub roc_long: Vec<Option<f64>>,
    pub volume_avg: Vec<Option<f64>>,
    pub volume_z: Vec<Option<f64>>,
    pub relative_strength: Vec<Option<f64>>,
}

/// One aligned row of the table, for readers that only care about the
/// state at a single bar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorRow {
    pub ma_short: Option<f64>,
    pub ma_mid: Option<f64>,
    pub ma_long: Option<f64>,
    pub rsi: Option<f64>,
    pub rsi_fast: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub atr: Option<f64>,
    pub adx: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub donchian_upper: Option<f64>,
    pub donchian_lower: Option<f64>,
    pub vwap: Option<f64>,
    pub roc_short: Option<f64>,
    pub roc_long: Option<f64>,
    pub volume_avg: Option<f64>,
    pub volume_z: Option<f64>,
    pub relative_strength: Option<f64>,
}

impl IndicatorTable {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn row(&self, index: usize) -> Option<IndicatorRow> {
        if index >= self.len {
            return None;
        }
        Some(IndicatorRow {
            ma_short: self.ma_short[index],
            ma_mid: self.ma_mid[index],
            ma_long: self.ma_long[index],
            rsi: self.rsi[index],
            rsi_fast: self.rsi_fast[index],
            macd: self.macd[index],
            macd_signal: self.macd_signal[index],
            macd_histogram: self.macd_histogram[index],
            bb_upper: self.bb_upper[index],
            bb_middle: self.bb_middle[index],
            bb_lower: self.bb_lower[index],
            atr: self.atr[index],
            adx: self.adx[index],
            stoch_k: self.stoch_k[index],
            stoch_d: self.stoch_d[index],
            donchian_upper: self.donchian_upper[index],
            donchian_lower: self.donchian_lower[index],
            vwap: self.vwap[index],
            roc_short: self.roc_short[index],
            roc_long: self.roc_long[index],
            volume_avg: self.volume_avg[index],
            volume_z: self.volume_z[index],
            relative_strength: self.relative_strength[index],
        })
    }

    pub fn latest(&self) -> Option<IndicatorRow> {
        self.len.checked_sub(1).and_then(|i| self.row(i))
    }
}

/// Computes the full battery over an ascending bar series.
///
/// Fails with [`TradefuseError::InsufficientData`] when fewer than
/// `settings.min_bars` bars are supplied, and with
/// [`TradefuseError::InvalidInput`] when timestamps are out of order.
/// Relative strength is only populated when a benchmark
/// series of matching length is given.
pub fn compute(
    bars: &[OhlcvBar],
    benchmark: Option<&[OhlcvBar]>,
    settings: &EngineSettings,
) -> Result<IndicatorTable, TradefuseError> {
    if bars.len() < settings.min_bars {
        let symbol = bars.first().map(|b| b.symbol.clone()).unwrap_or_default();
        return Err(TradefuseError::InsufficientData {
            symbol,
            bars: bars.len(),
            minimum: settings.min_bars,
        });
    }
    if !ohlcv::is_ascending(bars) {
        return Err(TradefuseError::InvalidInput {
            reason: "bars must be in ascending timestamp order".into(),
        });
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

    let macd_cols = macd::macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    let bb_cols = bollinger::bollinger(&closes, BOLLINGER_PERIOD, BOLLINGER_MULTIPLIER);
    let stoch_cols = stochastic::stochastic(bars, STOCHASTIC_K_PERIOD, STOCHASTIC_D_PERIOD);
    let donchian_cols = donchian::donchian(bars, DONCHIAN_PERIOD);
    let volume_cols = volume::volume_profile(&volumes, VOLUME_PERIOD);

    let relative_strength = match benchmark {
        Some(bench) => {
            let bench_closes: Vec<f64> = bench.iter().map(|b| b.close).collect();
            momentum::relative_strength(&closes, &bench_closes, RELATIVE_STRENGTH_PERIOD)
        }
        None => vec![None; bars.len()],
    };

    Ok(IndicatorTable {
        len: bars.len(),
        ma_short: moving_average::sma(&closes, MA_SHORT_PERIOD),
        ma_mid: moving_average::sma(&closes, MA_MID_PERIOD),
        ma_long: moving_average::sma(&closes, MA_LONG_PERIOD),
        rsi: rsi::rsi(&closes, RSI_PERIOD),
        rsi_fast: rsi::rsi(&closes, RSI_FAST_PERIOD),
        macd: macd_cols.line,
        macd_signal: macd_cols.signal,
        macd_histogram: macd_cols.histogram,
        bb_upper: bb_cols.upper,
        bb_middle: bb_cols.middle,
        bb_lower: bb_cols.lower,
        atr: atr::atr(bars, ATR_PERIOD),
        adx: adx::adx(bars, ADX_PERIOD),
        stoch_k: stoch_cols.k,
        stoch_d: stoch_cols.d,
        donchian_upper: donchian_cols.upper,
        donchian_lower: donchian_cols.lower,
        vwap: vwap::vwap(bars),
        roc_short: momentum::roc(&closes, ROC_SHORT_PERIOD),
        roc_long: momentum::roc(&closes, ROC_LONG_PERIOD),
        volume_avg: volume_cols.average,
        volume_z: volume_cols.z_score,
        relative_strength,
    })
}
