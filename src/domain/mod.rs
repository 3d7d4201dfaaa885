//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod decision;
pub mod lookback;
pub mod request;
pub mod config_validation;
pub mod error;
