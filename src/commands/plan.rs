//! Plan command implementation

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::info;

use strategy_scout::risk::{RiskManager, TradePlan};
use strategy_scout::{Direction, PriceSeries};

use super::{banner, load_inputs};

/// Plan at `entry`, or at the last close
pub(crate) fn build_plan(
    risk: &RiskManager,
    series: &PriceSeries,
    direction: Direction,
    entry: Option<f64>,
) -> Result<TradePlan> {
    let entry = match entry {
        Some(price) => price,
        None => series.last().map(|c| c.close).context("Series is empty")?,
    };

    match risk.plan(series, entry, direction) {
        Some(plan) => Ok(plan),
        None => bail!(
            "Cannot plan a {} trade at {:.2}: need {} bars of history for the ATR and a non-zero range",
            direction,
            entry,
            risk.config().atr_period + 1
        ),
    }
}

pub fn run(
    symbol: String,
    config_path: PathBuf,
    direction: String,
    entry: Option<f64>,
) -> Result<()> {
    let direction: Direction = direction.parse()?;
    let (config, symbol, series) = load_inputs(&config_path, &symbol)?;
    let risk = RiskManager::new(config.risk.clone())?;

    let plan = build_plan(&risk, &series, direction, entry)?;
    info!("Planned {} {} at {:.2}", direction, symbol, plan.entry_price);

    banner(&format!("TRADE PLAN: {} {}", direction, symbol));
    println!("Account:            {:.2}", config.risk.account_size);
    println!("Risk per trade:     {:.1}%", config.risk.risk_per_trade * 100.0);
    println!("Entry:              {:.2}", plan.entry_price);
    println!("ATR({}):            {:.4}", config.risk.atr_period, plan.atr);
    println!("Stop loss:          {:.2}", plan.stop_loss);
    println!("Take profit:        {:.2}", plan.take_profit);
    println!("Risk/reward:        1:{:.1}", plan.rr_ratio);
    println!("Units:              {:.4}", plan.position_size);
    println!("Invested:           {:.2}", plan.invested_amount);
    println!("Amount at risk:     {:.2}", plan.account_risk_amount);
    println!("Potential gain:     {:.2}", plan.potential_gain);
    println!("{}", "=".repeat(70));

    Ok(())
}
