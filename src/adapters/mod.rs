//! Concrete adapter implementations for ports.

pub mod cached_history;
pub mod csv_adapter;
pub mod file_config_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
pub mod text_report;
#[cfg(feature = "yahoo")]
pub mod yahoo_adapter;
