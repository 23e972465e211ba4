//! Core domain logic, free of I/O.

pub mod backtest;
pub mod config_validation;
pub mod error;
pub mod kmeans;
pub mod metrics;
pub mod ohlcv;
pub mod portfolio;
pub mod regime;
pub mod rolling;
pub mod signal;
pub mod strategy;
