//! Port traits for external collaborators.

pub mod market_data_port;
pub mod exchange_port;
pub mod ledger_port;
pub mod config_port;
