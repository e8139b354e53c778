//! Trade ledger rows, balances and order types.

use std::fmt;

use chrono::NaiveDateTime;

use crate::domain::error::TradefuseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
    Cancel,
}

impl TradeAction {
    pub fn parse(name: &str) -> Option<TradeAction> {
        match name.trim().to_ascii_uppercase().as_str() {
            "BUY" => Some(TradeAction::Buy),
            "SELL" => Some(TradeAction::Sell),
            "HOLD" => Some(TradeAction::Hold),
            "CANCEL" => Some(TradeAction::Cancel),
            _ => None,
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
            TradeAction::Hold => "HOLD",
            TradeAction::Cancel => "CANCEL",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Failure,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExecutionStatus::Success => "SUCCESS",
            ExecutionStatus::Failure => "FAILURE",
        })
    }
}

impl ExecutionStatus {
    pub fn parse(name: &str) -> Option<ExecutionStatus> {
        match name.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" => Some(ExecutionStatus::Success),
            "FAILURE" => Some(ExecutionStatus::Failure),
            _ => None,
        }
    }
}

/// One ledger row. Exactly one is written per execution cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub action: TradeAction,
    /// Quote-currency amount involved; 0.0 for HOLD and CANCEL.
    pub amount: f64,
    pub action_string: String,
    pub reason: String,
    /// Quote balance snapshot after a successful placement.
    pub execution_quote: Option<f64>,
    /// Base balance snapshot after a successful placement.
    pub execution_base: Option<f64>,
    pub status: ExecutionStatus,
}

/// A ledger row together with its assigned id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTrade {
    pub id: i64,
    pub trade: Trade,
}

/// Account balance for one currency.
#[derive(Debug, Clone, PartialEq)]
pub struct Balance {
    pub currency: String,
    pub available: f64,
    pub locked: f64,
    pub average_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderType {
    Market,
    Limit,
    StopLimit,
}

/// An order to be placed on the exchange.
///
/// Field requirements depend on the order type; [`OrderRequest::validate`]
/// enforces them before anything reaches the exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub side: OrderSide,
    pub quote_currency: String,
    pub target_currency: String,
    pub order_type: OrderType,
    /// Limit price; required for limit and stop-limit orders.
    pub price: Option<f64>,
    /// Quantity; required for limit, stop-limit and market sells.
    pub quantity: Option<f64>,
    /// Quote amount; required for market buys.
    pub amount: Option<f64>,
    /// Activation price; required for stop-limit orders.
    pub trigger_price: Option<f64>,
    /// Referenced order for cancellation.
    pub order_id: Option<String>,
}

impl OrderRequest {
    pub fn validate(&self) -> Result<(), TradefuseError> {
        match self.order_type {
            OrderType::Limit | OrderType::StopLimit => {
                if self.price.is_none() {
                    return Err(invalid("limit orders require a price"));
                }
                if self.quantity.is_none() {
                    return Err(invalid("limit orders require a quantity"));
                }
                if self.order_type == OrderType::StopLimit && self.trigger_price.is_none() {
                    return Err(invalid("stop-limit orders require a trigger price"));
                }
            }
            OrderType::Market => match self.side {
                OrderSide::Buy if self.amount.is_none() => {
                    return Err(invalid("market buys require an amount"));
                }
                OrderSide::Sell if self.quantity.is_none() => {
                    return Err(invalid("market sells require a quantity"));
                }
                _ => {}
            },
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> TradefuseError {
    TradefuseError::InvalidInput {
        reason: reason.into(),
    }
}

/// Result of an order placement, tagged by the exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    Filled {
        order_id: String,
        /// Quote balance after the fill.
        quote_balance: f64,
        /// Base balance after the fill.
        base_balance: f64,
    },
    Rejected {
        reason: String,
    },
}
