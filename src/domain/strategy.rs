//! Rule-based technical strategies evaluated against the latest bars.
//!
//! Each strategy is a boolean predicate over the bar series and the
//! indicator table. A strategy whose inputs are not yet defined (warmup)
//! simply does not trigger; it never errors.

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::indicator::IndicatorTable;
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StrategyKind {
    /// Price pulled back near the short moving average while holding the mid.
    Pullback,
    /// RSI, lower Bollinger band and stochastic all stretched down.
    Oversold,
    /// MACD histogram crossing from negative to positive.
    MacdLong,
    /// Volume spike on a down-beaten RSI with a real price move.
    VolumeSpike,
    /// Short moving average crossing above the mid.
    GoldenCross,
    /// Close breaking the prior Donchian upper band on unusual volume.
    Breakout,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 6] = [
        StrategyKind::Pullback,
        StrategyKind::Oversold,
        StrategyKind::MacdLong,
        StrategyKind::VolumeSpike,
        StrategyKind::GoldenCross,
        StrategyKind::Breakout,
    ];

    pub fn parse(name: &str) -> Option<StrategyKind> {
        match name.trim().to_ascii_uppercase().as_str() {
            "PULLBACK" => Some(StrategyKind::Pullback),
            "OVERSOLD" => Some(StrategyKind::Oversold),
            "MACD_LONG" => Some(StrategyKind::MacdLong),
            "VOLUME_SPIKE" => Some(StrategyKind::VolumeSpike),
            "GOLDEN_CROSS" => Some(StrategyKind::GoldenCross),
            "BREAKOUT" => Some(StrategyKind::Breakout),
            _ => None,
        }
    }

    /// Parses a comma-separated list, silently skipping unknown names.
    pub fn parse_list(names: &str) -> Vec<StrategyKind> {
        names.split(',').filter_map(StrategyKind::parse).collect()
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Pullback => "PULLBACK",
            StrategyKind::Oversold => "OVERSOLD",
            StrategyKind::MacdLong => "MACD_LONG",
            StrategyKind::VolumeSpike => "VOLUME_SPIKE",
            StrategyKind::GoldenCross => "GOLDEN_CROSS",
            StrategyKind::Breakout => "BREAKOUT",
        };
        f.write_str(name)
    }
}

/// Outcome of evaluating one strategy at the latest bar.
#[derive(Debug, Clone, PartialEq)]
pub struct TechnicalSignal {
    pub strategy: StrategyKind,
    pub triggered: bool,
    /// Inputs the predicate actually looked at, keyed by name.
    pub details: BTreeMap<String, f64>,
    pub description: String,
}

impl TechnicalSignal {
    fn quiet(strategy: StrategyKind, description: &str) -> TechnicalSignal {
        TechnicalSignal {
            strategy,
            triggered: false,
            details: BTreeMap::new(),
            description: description.into(),
        }
    }
}

pub fn evaluate(kind: StrategyKind, bars: &[OhlcvBar], table: &IndicatorTable) -> TechnicalSignal {
    match kind {
        StrategyKind::Pullback => evaluate_pullback(bars, table),
        StrategyKind::Oversold => evaluate_oversold(bars, table),
        StrategyKind::MacdLong => evaluate_macd_long(table),
        StrategyKind::VolumeSpike => evaluate_volume_spike(bars, table),
        StrategyKind::GoldenCross => evaluate_golden_cross(table),
        StrategyKind::Breakout => evaluate_breakout(bars, table),
    }
}

pub fn evaluate_all(
    kinds: &[StrategyKind],
    bars: &[OhlcvBar],
    table: &IndicatorTable,
) -> Vec<TechnicalSignal> {
    kinds.iter().map(|k| evaluate(*k, bars, table)).collect()
}

fn evaluate_pullback(bars: &[OhlcvBar], table: &IndicatorTable) -> TechnicalSignal {
    let kind = StrategyKind::Pullback;
    let (Some(bar), Some(row)) = (bars.last(), table.latest()) else {
        return TechnicalSignal::quiet(kind, "no data");
    };
    let (Some(ma_short), Some(ma_mid)) = (row.ma_short, row.ma_mid) else {
        return TechnicalSignal::quiet(kind, "moving averages not ready");
    };

    let triggered = bar.close <= ma_short * 1.03 && bar.close >= ma_mid * 0.98;
    let mut details = BTreeMap::new();
    details.insert("close".into(), bar.close);
    details.insert("ma_short".into(), ma_short);
    details.insert("ma_mid".into(), ma_mid);
    TechnicalSignal {
        strategy: kind,
        triggered,
        details,
        description: if triggered {
            "price pulled back to the short average above mid support".into()
        } else {
            "price not in the pullback zone".into()
        },
    }
}

fn evaluate_oversold(bars: &[OhlcvBar], table: &IndicatorTable) -> TechnicalSignal {
    let kind = StrategyKind::Oversold;
    let (Some(bar), Some(row)) = (bars.last(), table.latest()) else {
        return TechnicalSignal::quiet(kind, "no data");
    };
    let (Some(rsi), Some(bb_lower), Some(stoch_k)) = (row.rsi, row.bb_lower, row.stoch_k) else {
        return TechnicalSignal::quiet(kind, "oscillators not ready");
    };

    let triggered = rsi < 40.0 && bar.close <= bb_lower * 1.02 && stoch_k < 30.0;
    let mut details = BTreeMap::new();
    details.insert("rsi".into(), rsi);
    details.insert("close".into(), bar.close);
    details.insert("bb_lower".into(), bb_lower);
    details.insert("stoch_k".into(), stoch_k);
    TechnicalSignal {
        strategy: kind,
        triggered,
        details,
        description: if triggered {
            "oscillators stretched to the downside".into()
        } else {
            "not oversold".into()
        },
    }
}

fn evaluate_macd_long(table: &IndicatorTable) -> TechnicalSignal {
    let kind = StrategyKind::MacdLong;
    let last = table.latest();
    let prev = table.len().checked_sub(2).and_then(|i| table.row(i));
    let (Some(last), Some(prev)) = (last, prev) else {
        return TechnicalSignal::quiet(kind, "no data");
    };
    let (Some(hist), Some(prev_hist)) = (last.macd_histogram, prev.macd_histogram) else {
        return TechnicalSignal::quiet(kind, "MACD not ready");
    };

    let triggered = prev_hist < 0.0 && hist > 0.0;
    let mut details = BTreeMap::new();
    details.insert("macd_histogram".into(), hist);
    details.insert("prev_macd_histogram".into(), prev_hist);
    TechnicalSignal {
        strategy: kind,
        triggered,
        details,
        description: if triggered {
            "MACD histogram crossed above zero".into()
        } else {
            "no bullish MACD cross".into()
        },
    }
}

fn evaluate_volume_spike(bars: &[OhlcvBar], table: &IndicatorTable) -> TechnicalSignal {
    let kind = StrategyKind::VolumeSpike;
    let n = bars.len();
    let (Some(bar), Some(row)) = (bars.last(), table.latest()) else {
        return TechnicalSignal::quiet(kind, "no data");
    };
    let (Some(volume_avg), Some(rsi)) = (row.volume_avg, row.rsi) else {
        return TechnicalSignal::quiet(kind, "volume baseline not ready");
    };
    let Some(prev_close) = n.checked_sub(2).map(|i| bars[i].close) else {
        return TechnicalSignal::quiet(kind, "no prior bar");
    };
    if prev_close == 0.0 {
        return TechnicalSignal::quiet(kind, "prior close is zero");
    }

    let change = (bar.close - prev_close) / prev_close;
    let triggered = bar.volume > volume_avg * 2.0 && rsi < 50.0 && change.abs() > 0.01;
    let mut details = BTreeMap::new();
    details.insert("volume".into(), bar.volume);
    details.insert("volume_avg".into(), volume_avg);
    details.insert("rsi".into(), rsi);
    details.insert("change".into(), change);
    TechnicalSignal {
        strategy: kind,
        triggered,
        details,
        description: if triggered {
            "unusual volume with a real price move at a low RSI".into()
        } else {
            "volume within its usual range".into()
        },
    }
}

fn evaluate_golden_cross(table: &IndicatorTable) -> TechnicalSignal {
    let kind = StrategyKind::GoldenCross;
    let last = table.latest();
    let prev = table.len().checked_sub(2).and_then(|i| table.row(i));
    let (Some(last), Some(prev)) = (last, prev) else {
        return TechnicalSignal::quiet(kind, "no data");
    };
    let (Some(short), Some(mid), Some(prev_short), Some(prev_mid)) =
        (last.ma_short, last.ma_mid, prev.ma_short, prev.ma_mid)
    else {
        return TechnicalSignal::quiet(kind, "moving averages not ready");
    };

    let triggered = prev_short <= prev_mid && short > mid;
    let mut details = BTreeMap::new();
    details.insert("ma_short".into(), short);
    details.insert("ma_mid".into(), mid);
    details.insert("prev_ma_short".into(), prev_short);
    details.insert("prev_ma_mid".into(), prev_mid);
    TechnicalSignal {
        strategy: kind,
        triggered,
        details,
        description: if triggered {
            "short average crossed above the mid".into()
        } else {
            "no fresh cross".into()
        },
    }
}

fn evaluate_breakout(bars: &[OhlcvBar], table: &IndicatorTable) -> TechnicalSignal {
    let kind = StrategyKind::Breakout;
    let (Some(bar), Some(row)) = (bars.last(), table.latest()) else {
        return TechnicalSignal::quiet(kind, "no data");
    };
    let prev = table.len().checked_sub(2).and_then(|i| table.row(i));
    let Some(prev) = prev else {
        return TechnicalSignal::quiet(kind, "no prior bar");
    };
    let (Some(prev_upper), Some(volume_z)) = (prev.donchian_upper, row.volume_z) else {
        return TechnicalSignal::quiet(kind, "channel not ready");
    };

    let triggered = bar.close > prev_upper && volume_z > 1.0;
    let mut details = BTreeMap::new();
    details.insert("close".into(), bar.close);
    details.insert("prev_donchian_upper".into(), prev_upper);
    details.insert("volume_z".into(), volume_z);
    TechnicalSignal {
        strategy: kind,
        triggered,
        details,
        description: if triggered {
            "close above the prior channel high on unusual volume".into()
        } else {
            "inside the channel".into()
        },
    }
}
