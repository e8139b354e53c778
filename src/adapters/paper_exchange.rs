//! In-memory paper exchange.
//!
//! Deterministic fills against a per-symbol mark price, with optional
//! rejection and error injection for exercising failure paths.

use crate::domain::error::TradefuseError;
use crate::domain::trade::{Balance, OrderOutcome, OrderRequest, OrderSide, OrderType};
use crate::ports::exchange_port::ExchangePort;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct AccountState {
    balances: HashMap<String, Balance>,
    mark_prices: HashMap<String, f64>,
    active_orders: Vec<String>,
    next_order_id: u64,
    reject_reason: Option<String>,
    error_reason: Option<String>,
}

pub struct PaperExchange {
    state: Mutex<AccountState>,
}

impl PaperExchange {
    pub fn new() -> Self {
        PaperExchange {
            state: Mutex::new(AccountState::default()),
        }
    }

    /// Credits a currency. `average_price` is the entry price carried on
    /// the balance (0.0 for the quote currency).
    pub fn deposit(&self, currency: &str, available: f64, average_price: f64) {
        let mut state = self.lock();
        let entry = state
            .balances
            .entry(currency.to_string())
            .or_insert_with(|| zero_balance(currency));
        entry.available += available;
        entry.average_price = average_price;
    }

    /// Sets the fill price for market orders on `symbol`.
    pub fn set_mark_price(&self, symbol: &str, price: f64) {
        self.lock().mark_prices.insert(symbol.to_string(), price);
    }

    pub fn add_active_order(&self, order_id: &str) {
        self.lock().active_orders.push(order_id.to_string());
    }

    /// Every subsequent placement comes back `Rejected` with this reason.
    pub fn reject_orders(&self, reason: &str) {
        self.lock().reject_reason = Some(reason.to_string());
    }

    /// Every subsequent call fails with an exchange error.
    pub fn fail_with(&self, reason: &str) {
        self.lock().error_reason = Some(reason.to_string());
    }

    pub fn balance_of(&self, currency: &str) -> Balance {
        self.lock()
            .balances
            .get(currency)
            .cloned()
            .unwrap_or_else(|| zero_balance(currency))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AccountState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for PaperExchange {
    fn default() -> Self {
        PaperExchange::new()
    }
}

fn zero_balance(currency: &str) -> Balance {
    Balance {
        currency: currency.to_string(),
        available: 0.0,
        locked: 0.0,
        average_price: 0.0,
    }
}

impl ExchangePort for PaperExchange {
    fn get_balance(&self, currencies: &[&str]) -> Result<Vec<Balance>, TradefuseError> {
        let state = self.lock();
        if let Some(reason) = &state.error_reason {
            return Err(TradefuseError::Exchange {
                reason: reason.clone(),
            });
        }
        Ok(currencies
            .iter()
            .map(|&c| {
                state
                    .balances
                    .get(c)
                    .cloned()
                    .unwrap_or_else(|| zero_balance(c))
            })
            .collect())
    }

    fn place_order(&self, request: &OrderRequest) -> Result<OrderOutcome, TradefuseError> {
        request.validate()?;

        let mut state = self.lock();
        if let Some(reason) = &state.error_reason {
            return Err(TradefuseError::Exchange {
                reason: reason.clone(),
            });
        }
        if let Some(reason) = &state.reject_reason {
            return Ok(OrderOutcome::Rejected {
                reason: reason.clone(),
            });
        }

        let symbol = request.target_currency.clone();
        let quote = request.quote_currency.clone();
        let fill_price = match request.order_type {
            OrderType::Market => match state.mark_prices.get(&symbol) {
                Some(&price) => price,
                None => {
                    return Ok(OrderOutcome::Rejected {
                        reason: format!("no mark price for {symbol}"),
                    });
                }
            },
            // limit and stop-limit fill at the requested price
            OrderType::Limit | OrderType::StopLimit => match request.price {
                Some(price) => price,
                None => {
                    return Ok(OrderOutcome::Rejected {
                        reason: "limit order without a price".into(),
                    });
                }
            },
        };
        if fill_price <= 0.0 {
            return Ok(OrderOutcome::Rejected {
                reason: format!("non-positive fill price for {symbol}"),
            });
        }

        let (spend, quantity) = match request.side {
            OrderSide::Buy => {
                let spend = match (request.amount, request.quantity) {
                    (Some(amount), _) => amount,
                    (None, Some(qty)) => qty * fill_price,
                    (None, None) => {
                        return Ok(OrderOutcome::Rejected {
                            reason: "buy order without amount or quantity".into(),
                        });
                    }
                };
                (spend, spend / fill_price)
            }
            OrderSide::Sell => {
                let qty = match request.quantity {
                    Some(qty) => qty,
                    None => {
                        return Ok(OrderOutcome::Rejected {
                            reason: "sell order without quantity".into(),
                        });
                    }
                };
                (qty * fill_price, qty)
            }
        };

        match request.side {
            OrderSide::Buy => {
                let quote_available = state
                    .balances
                    .get(&quote)
                    .map_or(0.0, |b| b.available);
                if quote_available < spend {
                    return Ok(OrderOutcome::Rejected {
                        reason: format!("insufficient {quote} balance"),
                    });
                }
                if let Some(balance) = state.balances.get_mut(&quote) {
                    balance.available -= spend;
                }
                let base = state
                    .balances
                    .entry(symbol.clone())
                    .or_insert_with(|| zero_balance(&symbol));
                let prior_value = base.average_price * base.available;
                base.available += quantity;
                base.average_price = (prior_value + spend) / base.available;
            }
            OrderSide::Sell => {
                let base_available = state
                    .balances
                    .get(&symbol)
                    .map_or(0.0, |b| b.available);
                if base_available < quantity {
                    return Ok(OrderOutcome::Rejected {
                        reason: format!("insufficient {symbol} balance"),
                    });
                }
                if let Some(balance) = state.balances.get_mut(&symbol) {
                    balance.available -= quantity;
                }
                let quote_balance = state
                    .balances
                    .entry(quote.clone())
                    .or_insert_with(|| zero_balance(&quote));
                quote_balance.available += spend;
            }
        }

        state.next_order_id += 1;
        let order_id = format!("paper-{}", state.next_order_id);
        let quote_balance = state.balances.get(&quote).map_or(0.0, |b| b.available);
        let base_balance = state.balances.get(&symbol).map_or(0.0, |b| b.available);

        Ok(OrderOutcome::Filled {
            order_id,
            quote_balance,
            base_balance,
        })
    }

    fn cancel_order(&self, order_id: &str, _symbol: &str) -> Result<(), TradefuseError> {
        let mut state = self.lock();
        if let Some(reason) = &state.error_reason {
            return Err(TradefuseError::Exchange {
                reason: reason.clone(),
            });
        }
        match state.active_orders.iter().position(|id| id == order_id) {
            Some(index) => {
                state.active_orders.remove(index);
                Ok(())
            }
            None => Err(TradefuseError::Exchange {
                reason: format!("unknown order id {order_id}"),
            }),
        }
    }

    fn active_orders(&self, _symbol: &str) -> Result<Vec<String>, TradefuseError> {
        let state = self.lock();
        if let Some(reason) = &state.error_reason {
            return Err(TradefuseError::Exchange {
                reason: reason.clone(),
            });
        }
        Ok(state.active_orders.clone())
    }
}
