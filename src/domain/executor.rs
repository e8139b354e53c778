//! Trade execution: turns a decision into an exchange order and exactly
//! one ledger row per cycle.
//!
//! Failure paths inside a branch (balance too small, placement rejected,
//! cancellation errors) are captured into the row and the report; only a
//! ledger write failure aborts the cycle.

use chrono::NaiveDateTime;

use crate::domain::error::TradefuseError;
use crate::domain::settings::EngineSettings;
use crate::domain::trade::{
    Balance, ExecutionStatus, OrderOutcome, OrderRequest, Trade, TradeAction,
};
use crate::ports::exchange_port::ExchangePort;
use crate::ports::ledger_port::LedgerPort;

/// What to do this cycle, as decided upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeDecision {
    pub action: TradeAction,
    pub reason: String,
    pub order: Option<OrderRequest>,
}

/// Outcome of one execution cycle. `action` is the action actually taken:
/// a BUY or SELL that could not go through degrades to CANCEL.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    pub action: TradeAction,
    pub status: ExecutionStatus,
    pub reason: String,
    pub trade_id: i64,
}

pub struct TradeExecutor<'a> {
    exchange: &'a dyn ExchangePort,
    ledger: &'a dyn LedgerPort,
    settings: &'a EngineSettings,
}

impl<'a> TradeExecutor<'a> {
    pub fn new(
        exchange: &'a dyn ExchangePort,
        ledger: &'a dyn LedgerPort,
        settings: &'a EngineSettings,
    ) -> Self {
        TradeExecutor {
            exchange,
            ledger,
            settings,
        }
    }

    /// Runs one cycle: acts on the decision at the given market price and
    /// records the outcome. Returns `Err` only when the ledger write fails
    /// or the decision's order is malformed.
    pub fn execute(
        &self,
        symbol: &str,
        price: f64,
        decision: &TradeDecision,
        now: NaiveDateTime,
    ) -> Result<ExecutionReport, TradefuseError> {
        if let Some(order) = &decision.order {
            order.validate()?;
        }
        match decision.action {
            TradeAction::Buy => self.handle_buy(symbol, price, decision, now),
            TradeAction::Sell => self.handle_sell(symbol, price, decision, now),
            TradeAction::Hold => self.handle_hold(symbol, decision, now),
            TradeAction::Cancel => self.handle_cancel(symbol, decision, now),
        }
    }

    fn handle_buy(
        &self,
        symbol: &str,
        price: f64,
        decision: &TradeDecision,
        now: NaiveDateTime,
    ) -> Result<ExecutionReport, TradefuseError> {
        let quote = self.settings.quote_currency.clone();
        let balance = match self.fetch_balance(&quote) {
            Ok(balance) => balance,
            Err(err) => {
                return self.record_aborted(
                    symbol,
                    TradeAction::Buy,
                    format!("balance lookup failed: {err}"),
                    now,
                );
            }
        };

        if balance.available < self.settings.min_order_amount {
            return self.record_aborted(
                symbol,
                TradeAction::Buy,
                format!(
                    "order amount {:.0} {} is below the minimum order amount {:.0}",
                    balance.available, quote, self.settings.min_order_amount
                ),
                now,
            );
        }

        let outcome = match &decision.order {
            Some(order) => match self.exchange.place_order(order) {
                Ok(outcome) => Some(outcome),
                Err(err) => {
                    return self.record_aborted(
                        symbol,
                        TradeAction::Buy,
                        format!("order placement failed: {err}"),
                        now,
                    );
                }
            },
            None => None,
        };

        let spent = decision
            .order
            .as_ref()
            .and_then(|o| match (o.price, o.quantity) {
                (Some(p), Some(q)) => Some(p * q),
                _ => o.amount,
            })
            .unwrap_or(balance.available);
        let action_string = format!(
            "[total balance {:.0} {}] -> spent {:.0} on {} at {:.2}",
            balance.available, quote, spent, symbol, price
        );

        let (status, execution_quote, execution_base) = classify(&outcome);
        let trade = Trade {
            timestamp: now,
            symbol: symbol.into(),
            action: TradeAction::Buy,
            amount: balance.available,
            action_string,
            reason: decision.reason.clone(),
            execution_quote,
            execution_base,
            status,
        };
        let trade_id = self.ledger.insert_trade(&trade)?;

        Ok(ExecutionReport {
            action: TradeAction::Buy,
            status,
            reason: decision.reason.clone(),
            trade_id,
        })
    }

    fn handle_sell(
        &self,
        symbol: &str,
        price: f64,
        decision: &TradeDecision,
        now: NaiveDateTime,
    ) -> Result<ExecutionReport, TradefuseError> {
        let balance = match self.fetch_balance(symbol) {
            Ok(balance) => balance,
            Err(err) => {
                return self.record_aborted(
                    symbol,
                    TradeAction::Sell,
                    format!("balance lookup failed: {err}"),
                    now,
                );
            }
        };

        if balance.available <= 0.0 || balance.average_price <= 0.0 {
            return self.record_aborted(
                symbol,
                TradeAction::Sell,
                format!("insufficient {symbol} balance"),
                now,
            );
        }

        let outcome = match &decision.order {
            Some(order) => match self.exchange.place_order(order) {
                Ok(outcome) => Some(outcome),
                Err(err) => {
                    return self.record_aborted(
                        symbol,
                        TradeAction::Sell,
                        format!("order placement failed: {err}"),
                        now,
                    );
                }
            },
            None => None,
        };

        // Not the realized proceeds; a rough quote-currency equivalent
        // from the average entry price.
        let approximate_amount = balance.average_price * balance.available;
        let action_string = format!(
            "[total balance {:.8} {}] -> sold {:.8} {} at {:.2}",
            balance.available, symbol, balance.available, symbol, price
        );

        let (status, execution_quote, execution_base) = classify(&outcome);
        let trade = Trade {
            timestamp: now,
            symbol: symbol.into(),
            action: TradeAction::Sell,
            amount: approximate_amount,
            action_string,
            reason: decision.reason.clone(),
            execution_quote,
            execution_base,
            status,
        };
        let trade_id = self.ledger.insert_trade(&trade)?;

        Ok(ExecutionReport {
            action: TradeAction::Sell,
            status,
            reason: decision.reason.clone(),
            trade_id,
        })
    }

    fn handle_hold(
        &self,
        symbol: &str,
        decision: &TradeDecision,
        now: NaiveDateTime,
    ) -> Result<ExecutionReport, TradefuseError> {
        let trade = Trade {
            timestamp: now,
            symbol: symbol.into(),
            action: TradeAction::Hold,
            amount: 0.0,
            action_string: format!("watching {symbol} without trading"),
            reason: decision.reason.clone(),
            execution_quote: None,
            execution_base: None,
            status: ExecutionStatus::Success,
        };
        let trade_id = self.ledger.insert_trade(&trade)?;

        Ok(ExecutionReport {
            action: TradeAction::Hold,
            status: ExecutionStatus::Success,
            reason: decision.reason.clone(),
            trade_id,
        })
    }

    fn handle_cancel(
        &self,
        symbol: &str,
        decision: &TradeDecision,
        now: NaiveDateTime,
    ) -> Result<ExecutionReport, TradefuseError> {
        let order_id = decision.order.as_ref().and_then(|o| o.order_id.clone());

        // Cancellation problems are captured into the reason, never fatal.
        let detail = match order_id {
            Some(id) => match self.exchange.active_orders(symbol) {
                Ok(active) if !active.contains(&id) => {
                    format!("unknown order id {id}")
                }
                Ok(_) => match self.exchange.cancel_order(&id, symbol) {
                    Ok(()) => format!("cancelled order {id}"),
                    Err(err) => format!("cancel order failed: {err}"),
                },
                Err(err) => format!("active order lookup failed: {err}"),
            },
            None => "no order referenced".into(),
        };

        let trade = Trade {
            timestamp: now,
            symbol: symbol.into(),
            action: TradeAction::Cancel,
            amount: 0.0,
            action_string: detail.clone(),
            reason: decision.reason.clone(),
            execution_quote: None,
            execution_base: None,
            status: ExecutionStatus::Success,
        };
        let trade_id = self.ledger.insert_trade(&trade)?;

        Ok(ExecutionReport {
            action: TradeAction::Cancel,
            status: ExecutionStatus::Success,
            reason: detail,
            trade_id,
        })
    }

    fn fetch_balance(&self, currency: &str) -> Result<Balance, TradefuseError> {
        let mut balances = self.exchange.get_balance(&[currency])?;
        balances.pop().ok_or_else(|| TradefuseError::Exchange {
            reason: format!("no balance returned for {currency}"),
        })
    }

    /// Writes the FAILURE row for a branch that never reached the exchange
    /// and degrades the report to CANCEL.
    fn record_aborted(
        &self,
        symbol: &str,
        intended: TradeAction,
        reason: String,
        now: NaiveDateTime,
    ) -> Result<ExecutionReport, TradefuseError> {
        let trade = Trade {
            timestamp: now,
            symbol: symbol.into(),
            action: intended,
            amount: 0.0,
            action_string: format!("{intended} aborted: {reason}"),
            reason: reason.clone(),
            execution_quote: None,
            execution_base: None,
            status: ExecutionStatus::Failure,
        };
        let trade_id = self.ledger.insert_trade(&trade)?;

        Ok(ExecutionReport {
            action: TradeAction::Cancel,
            status: ExecutionStatus::Failure,
            reason,
            trade_id,
        })
    }
}

fn classify(outcome: &Option<OrderOutcome>) -> (ExecutionStatus, Option<f64>, Option<f64>) {
    match outcome {
        Some(OrderOutcome::Filled {
            quote_balance,
            base_balance,
            ..
        }) => (
            ExecutionStatus::Success,
            Some(*quote_balance),
            Some(*base_balance),
        ),
        Some(OrderOutcome::Rejected { .. }) | None => (ExecutionStatus::Failure, None, None),
    }
}
