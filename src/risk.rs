//! Volatility-based trade planning
//!
//! Stops sit a multiple of ATR away from the entry and targets a multiple of
//! that risk beyond it. Position size risks a fixed fraction of the account:
//!
//! ```text
//! units = (account_size * risk_fraction) / risk_per_unit
//! ```
//!
//! capped so that `units * entry_price <= account_size` (no leverage) and
//! floored to [`UNIT_DECIMALS`] places.
//! All amounts are dimensionless: the account and the prices just have to be
//! quoted in the same currency.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RiskError;
use crate::indicators::atr;
use crate::{Direction, PriceSeries};

/// Hard ceiling on the fraction of the account risked per trade
pub const MAX_RISK_FRACTION: f64 = 0.10;

/// Position sizes are floored to this many decimal places
pub const UNIT_DECIMALS: i32 = 6;

/// Account and sizing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub account_size: f64,
    /// Fraction of the account risked per trade (0.02 = 2%)
    pub risk_per_trade: f64,
    pub atr_multiplier: f64,
    pub risk_reward_ratio: f64,
    pub atr_period: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            account_size: 10_000.0,
            risk_per_trade: 0.02,
            atr_multiplier: 1.5,
            risk_reward_ratio: 2.0,
            atr_period: 14,
        }
    }
}

impl RiskConfig {
    pub fn with_account_size(mut self, account_size: f64) -> Self {
        self.account_size = account_size;
        self
    }

    pub fn with_risk_per_trade(mut self, risk: f64) -> Self {
        self.risk_per_trade = risk;
        self
    }

    pub fn with_atr_multiplier(mut self, multiplier: f64) -> Self {
        self.atr_multiplier = multiplier;
        self
    }

    pub fn with_risk_reward_ratio(mut self, ratio: f64) -> Self {
        self.risk_reward_ratio = ratio;
        self
    }

    pub fn validate(&self) -> Result<(), RiskError> {
        validate_account(self.account_size, self.risk_per_trade)?;
        check_positive("atr_multiplier", self.atr_multiplier)?;
        check_positive("risk_reward_ratio", self.risk_reward_ratio)?;
        if self.atr_period == 0 {
            return Err(RiskError::NonPositive {
                name: "atr_period",
                value: 0.0,
            });
        }
        Ok(())
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), RiskError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(RiskError::NonPositive { name, value });
    }
    Ok(())
}

fn validate_account(account_size: f64, risk_fraction: f64) -> Result<(), RiskError> {
    if !account_size.is_finite() || account_size <= 0.0 {
        return Err(RiskError::NonPositiveAccount(account_size));
    }
    if !(risk_fraction > 0.0 && risk_fraction <= MAX_RISK_FRACTION) {
        return Err(RiskError::RiskFractionOutOfRange {
            value: risk_fraction,
            max: MAX_RISK_FRACTION,
        });
    }
    Ok(())
}

/// Stop and target levels around an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSetup {
    pub entry: f64,
    pub direction: Direction,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub atr: f64,
    pub risk_per_unit: f64,
    pub potential_gain: f64,
    pub rr_ratio: f64,
}

/// A sized trade, ready to be journaled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePlan {
    pub entry_price: f64,
    pub direction: Direction,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub risk_per_unit: f64,
    pub position_size: f64,
    /// Amount lost if the stop is hit
    pub account_risk_amount: f64,
    pub atr: f64,
    pub rr_ratio: f64,
    /// Capital committed at entry
    pub invested_amount: f64,
    pub potential_gain: f64,
}

/// Build a setup from a known ATR value.
///
/// Returns `None` for an unusable ATR or entry, or when the stop would not
/// sit on the losing side of the entry.
pub fn trade_setup_with_atr(
    entry: f64,
    atr: f64,
    direction: Direction,
    atr_multiplier: f64,
    risk_reward_ratio: f64,
) -> Option<TradeSetup> {
    if !atr.is_finite() || atr <= 0.0 || !entry.is_finite() || entry <= 0.0 {
        return None;
    }

    let distance = atr * atr_multiplier;
    let (stop_loss, risk_per_unit) = match direction {
        Direction::Long => {
            let stop = entry - distance;
            (stop, entry - stop)
        }
        Direction::Short => {
            let stop = entry + distance;
            (stop, stop - entry)
        }
    };

    if risk_per_unit.is_nan() || risk_per_unit <= 0.0 {
        return None;
    }

    let reward = risk_per_unit * risk_reward_ratio;
    let take_profit = match direction {
        Direction::Long => entry + reward,
        Direction::Short => entry - reward,
    };

    Some(TradeSetup {
        entry,
        direction,
        stop_loss,
        take_profit,
        atr,
        risk_per_unit,
        potential_gain: (take_profit - entry).abs(),
        rr_ratio: risk_reward_ratio,
    })
}

/// Risk manager bound to one validated [`RiskConfig`]
#[derive(Debug, Clone)]
pub struct RiskManager {
    config: RiskConfig,
}

impl RiskManager {
    pub fn new(config: RiskConfig) -> Result<Self, RiskError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// ATR of the configured period at the last bar
    pub fn current_atr(&self, series: &PriceSeries) -> Option<f64> {
        atr(
            &series.highs(),
            &series.lows(),
            &series.closes(),
            self.config.atr_period,
        )
        .last()
        .copied()
        .flatten()
    }

    /// Stop/target levels from the series' most recent ATR.
    ///
    /// `None` when there is not enough history for the ATR or it is zero.
    pub fn get_trade_setup(
        &self,
        series: &PriceSeries,
        entry: f64,
        direction: Direction,
        atr_multiplier: f64,
        risk_reward_ratio: f64,
    ) -> Option<TradeSetup> {
        let current_atr = self.current_atr(series)?;
        trade_setup_with_atr(entry, current_atr, direction, atr_multiplier, risk_reward_ratio)
    }

    /// Units to buy or sell so that hitting the stop costs
    /// `account_size * risk_fraction`, never committing more than the account.
    pub fn calculate_position_size(
        account_size: f64,
        risk_fraction: f64,
        setup: &TradeSetup,
    ) -> Result<f64, RiskError> {
        validate_account(account_size, risk_fraction)?;
        check_positive("risk_per_unit", setup.risk_per_unit)?;
        check_positive("entry", setup.entry)?;

        let by_risk = account_size * risk_fraction / setup.risk_per_unit;
        let by_capital = account_size / setup.entry;

        if by_capital < by_risk {
            debug!(
                "Position capped by capital: {:.4} -> {:.4} units",
                by_risk, by_capital
            );
        }

        Ok(fit_units(
            by_risk.min(by_capital),
            setup,
            account_size,
            account_size * risk_fraction,
        ))
    }

    /// Full plan at `entry` using the configured multipliers and account
    pub fn plan(&self, series: &PriceSeries, entry: f64, direction: Direction) -> Option<TradePlan> {
        let setup = self.get_trade_setup(
            series,
            entry,
            direction,
            self.config.atr_multiplier,
            self.config.risk_reward_ratio,
        )?;
        self.plan_from_setup(&setup)
    }

    /// Size an existing setup against the configured account
    pub fn plan_from_setup(&self, setup: &TradeSetup) -> Option<TradePlan> {
        let units = Self::calculate_position_size(
            self.config.account_size,
            self.config.risk_per_trade,
            setup,
        )
        .ok()?;

        Some(TradePlan {
            entry_price: setup.entry,
            direction: setup.direction,
            stop_loss: setup.stop_loss,
            take_profit: setup.take_profit,
            risk_per_unit: setup.risk_per_unit,
            position_size: units,
            account_risk_amount: units * setup.risk_per_unit,
            atr: setup.atr,
            rr_ratio: setup.rr_ratio,
            invested_amount: units * setup.entry,
            potential_gain: units * setup.potential_gain,
        })
    }
}

/// Floor `units` to `UNIT_DECIMALS`, then step down one ulp at a time until
/// neither the capital nor the risk budget is exceeded after rounding.
fn fit_units(units: f64, setup: &TradeSetup, account_size: f64, risk_budget: f64) -> f64 {
    let scale = 10f64.powi(UNIT_DECIMALS);
    let mut units = (units * scale).floor() / scale;
    while units > 0.0
        && (units * setup.entry > account_size || units * setup.risk_per_unit > risk_budget)
    {
        units = f64::from_bits(units.to_bits() - 1);
    }
    units.max(0.0)
}
