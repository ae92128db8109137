//! Strategy Scout
//!
//! Technical-analysis research toolkit: a library of classic indicators and
//! long/flat strategies, a vectorized daily backtester, a grid-search scout
//! that picks one strategy per instrument under a drawdown limit, and an
//! ATR-based risk manager that turns a selection into a sized trade plan.

pub mod advisor;
pub mod backtest;
pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod journal;
pub mod risk;
pub mod scout;
pub mod strategies;
pub mod types;

pub use config::Config;
pub use types::*;
