//! Market data access port trait.

use crate::domain::error::TradefuseError;
use crate::domain::ohlcv::OhlcvBar;

pub trait MarketDataPort {
    /// Fetches up to `limit` most recent bars for `symbol` at `interval`,
    /// in ascending timestamp order.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, TradefuseError>;
}
