//! Domain error types.

/// Top-level error type for tradefuse.
#[derive(Debug, thiserror::Error)]
pub enum TradefuseError {
    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("market data error: {reason}")]
    MarketData { reason: String },

    #[error("exchange error: {reason}")]
    Exchange { reason: String },

    #[error("ledger error: {reason}")]
    Ledger { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradefuseError> for std::process::ExitCode {
    fn from(err: &TradefuseError) -> Self {
        let code: u8 = match err {
            TradefuseError::Io(_) => 1,
            TradefuseError::ConfigParse { .. }
            | TradefuseError::ConfigMissing { .. }
            | TradefuseError::ConfigInvalid { .. } => 2,
            TradefuseError::Ledger { .. } => 3,
            TradefuseError::Exchange { .. } | TradefuseError::MarketData { .. } => 4,
            TradefuseError::InsufficientData { .. } | TradefuseError::InvalidInput { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
