//! Optimize command implementation

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tracing::info;

use strategy_scout::advisor::{self, Advice};
use strategy_scout::risk::RiskManager;
use strategy_scout::scout::{ScoringPolicy, Scout, Winner};
use strategy_scout::strategies::GridMode;

use super::{banner, load_inputs};

pub fn run(
    symbol: String,
    config_path: PathBuf,
    mode_override: Option<String>,
    scoring_override: Option<String>,
    search_only: bool,
    json: bool,
) -> Result<()> {
    info!("Starting optimization for {}", symbol);

    let (mut config, symbol, series) = load_inputs(&config_path, &symbol)?;

    if let Some(mode) = mode_override {
        config.scout.grid = mode.parse::<GridMode>().map_err(|e| anyhow!(e))?;
        info!("Overriding grid mode to: {:?}", config.scout.grid);
    }
    if let Some(scoring) = scoring_override {
        config.scout.scoring = scoring.parse::<ScoringPolicy>().map_err(|e| anyhow!(e))?;
        info!("Overriding scoring policy to: {:?}", config.scout.scoring);
    }
    if search_only {
        config.scout.use_strategy_map = false;
    }

    let scout = Scout::new(config.scout.clone(), config.strategy_map.clone());
    let risk = RiskManager::new(config.risk.clone())?;

    let Some(winner) = scout.optimize(&symbol, &series) else {
        println!("{}: no safe strategy found", symbol);
        return Ok(());
    };
    let advice = advisor::advise(&winner, &series, &risk);

    if json {
        let payload = serde_json::json!({ "winner": winner, "advice": advice });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_winner(&winner);
        if let Some(advice) = &advice {
            print_advice(advice);
        }
    }

    info!("Optimization completed successfully");
    Ok(())
}

fn print_winner(winner: &Winner) {
    banner(&format!("BEST STRATEGY FOR {}", winner.symbol));
    println!("Strategy:           {}", winner.strategy);
    println!("Selected by:        {}", winner.mode);
    for (name, value) in &winner.params {
        println!("  {:<18}{}", format!("{}:", name), value);
    }
    println!("Score:              {:.4}", winner.score);
    println!("Total Return:       {:.2}%", winner.result.total_return * 100.0);
    println!("Buy & Hold:         {:.2}%", winner.result.benchmark_return * 100.0);
    println!("Sharpe Ratio:       {:.2}", winner.result.sharpe_ratio);
    println!("Max Drawdown:       {:.2}%", winner.result.max_drawdown * 100.0);
    println!("Time in Market:     {:.1}%", winner.result.exposure * 100.0);
    println!("Total Trades:       {}", winner.result.total_trades);
    println!("Win Rate:           {:.1}%", winner.result.win_rate * 100.0);
    println!("{}", "=".repeat(70));
}

fn print_advice(advice: &Advice) {
    println!("Last close:         {:.2}", advice.last_close);
    println!("Action:             {}", advice.action);
    if let Some(plan) = &advice.plan {
        println!("  Stop loss:        {:.2}", plan.stop_loss);
        println!("  Take profit:      {:.2}", plan.take_profit);
        println!("  Units:            {:.4}", plan.position_size);
        println!("  Invested:         {:.2}", plan.invested_amount);
        println!("  Risked:           {:.2}", plan.account_risk_amount);
    }
}
