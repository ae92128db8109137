//! Error types for configuration-level mistakes.
//!
//! Data insufficiency is not an error: short series degrade to
//! flat signals, sentinel backtests and `None` trade setups.

use thiserror::Error;

/// Out-of-range strategy parameters
#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    #[error("{strategy}: fast period ({fast}) must be < slow period ({slow})")]
    FastNotBelowSlow {
        strategy: &'static str,
        fast: usize,
        slow: usize,
    },

    #[error("{strategy}: {name} must be > 0")]
    ZeroPeriod {
        strategy: &'static str,
        name: &'static str,
    },

    #[error("{strategy}: {name} must be a positive finite number, got {value}")]
    NonPositive {
        strategy: &'static str,
        name: &'static str,
        value: f64,
    },

    #[error("{strategy}: {name} ({value}) must be within [{min}, {max}]")]
    OutOfRange {
        strategy: &'static str,
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{strategy}: entry threshold ({low}) must be below exit threshold ({high})")]
    ThresholdOrder {
        strategy: &'static str,
        low: f64,
        high: f64,
    },
}

/// Invalid risk manager inputs
#[derive(Debug, Error, PartialEq)]
pub enum RiskError {
    #[error("account size must be > 0, got {0}")]
    NonPositiveAccount(f64),

    #[error("risk fraction must be in (0, {max}], got {value}")]
    RiskFractionOutOfRange { value: f64, max: f64 },

    #[error("{name} must be a positive finite number, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("unknown trade direction '{0}' (expected LONG or SHORT)")]
    UnknownDirection(String),
}

/// Trade journal misuse
#[derive(Debug, Error, PartialEq)]
pub enum JournalError {
    #[error("{field} is not representable as money: {value}")]
    NotRepresentable { field: &'static str, value: f64 },

    #[error("trade {symbol} opened at {timestamp} is already closed")]
    AlreadyClosed { symbol: String, timestamp: String },

    #[error("no open trade at index {0}")]
    NoOpenTrade(usize),
}
