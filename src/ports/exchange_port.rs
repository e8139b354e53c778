//! Exchange access port trait.

use crate::domain::error::TradefuseError;
use crate::domain::trade::{Balance, OrderOutcome, OrderRequest};

pub trait ExchangePort {
    /// One balance per requested currency, in request order. Currencies the
    /// account has never touched come back zeroed.
    fn get_balance(&self, currencies: &[&str]) -> Result<Vec<Balance>, TradefuseError>;

    fn place_order(&self, request: &OrderRequest) -> Result<OrderOutcome, TradefuseError>;

    fn cancel_order(&self, order_id: &str, symbol: &str) -> Result<(), TradefuseError>;

    /// Ids of orders currently open for `symbol`.
    fn active_orders(&self, symbol: &str) -> Result<Vec<String>, TradefuseError>;
}
