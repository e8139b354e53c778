//! Concrete port implementations.

pub mod csv_market_data;
pub mod sqlite_ledger;
pub mod paper_exchange;
pub mod file_config_adapter;
