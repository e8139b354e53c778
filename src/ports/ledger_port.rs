//! Trade ledger port trait.

use crate::domain::error::TradefuseError;
use crate::domain::trade::{StoredTrade, Trade};

pub trait LedgerPort {
    /// Appends a trade row and returns its assigned id.
    fn insert_trade(&self, trade: &Trade) -> Result<i64, TradefuseError>;

    /// The most recent `limit` rows for `symbol`, newest first.
    fn recent_trades(&self, symbol: &str, limit: usize) -> Result<Vec<StoredTrade>, TradefuseError>;
}
