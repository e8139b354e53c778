//! Core domain types and logic.

pub mod ohlcv;
pub mod error;
pub mod settings;
pub mod indicator;
pub mod strategy;
pub mod combiner;
pub mod levels;
pub mod trade;
pub mod executor;
pub mod monitor;
