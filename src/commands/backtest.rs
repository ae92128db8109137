//! Backtest command implementation

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

use strategy_scout::backtest::{self, Trade};
use strategy_scout::strategies::StrategySpec;

use super::{banner, load_inputs};

pub fn run(
    symbol: String,
    config_path: PathBuf,
    strategy_json: Option<String>,
    json: bool,
) -> Result<()> {
    info!("Starting backtest");

    let (config, symbol, series) = load_inputs(&config_path, &symbol)?;

    let spec: StrategySpec = match strategy_json {
        Some(raw) => serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse strategy JSON: {}", raw))?,
        None => *config.strategy_map.get(&symbol).with_context(|| {
            format!(
                "{} has no strategy map entry; pass one with --strategy",
                symbol
            )
        })?,
    };
    spec.validate()
        .with_context(|| format!("Invalid strategy {}", spec))?;
    debug!("Strategy spec: {:?}", spec);

    info!("Running {} on {} bars", spec, series.len());
    let result = backtest::run(&series, &spec);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    banner(&format!("BACKTEST RESULTS: {}", symbol));
    println!("Strategy:           {}", spec);
    if result.is_sentinel() {
        println!(
            "Not enough history: {} bars, need at least {}",
            series.len(),
            backtest::MIN_BARS
        );
    } else {
        println!("Total Return:       {:.2}%", result.total_return * 100.0);
        println!("Buy & Hold:         {:.2}%", result.benchmark_return * 100.0);
        println!("Sharpe Ratio:       {:.2}", result.sharpe_ratio);
        println!("Max Drawdown:       {:.2}%", result.max_drawdown * 100.0);
        println!("Time in Market:     {:.1}%", result.exposure * 100.0);
        println!("Total Trades:       {}", result.total_trades);
        println!("Win Rate:           {:.1}%", result.win_rate * 100.0);
        println!("Profit Factor:      {:.2}", result.profit_factor);
        print_trades(&result.trades);
    }
    println!("{}", "=".repeat(70));

    info!("Backtest completed successfully");
    Ok(())
}

fn print_trades(trades: &[Trade]) {
    if trades.is_empty() {
        return;
    }
    println!("{}", "-".repeat(70));
    println!(
        "{:<12} {:>10} {:<12} {:>10} {:>6} {:>9}",
        "Entry", "Price", "Exit", "Price", "Bars", "Return%"
    );
    for trade in trades {
        let exit = if trade.open {
            "open".to_string()
        } else {
            trade.exit_date.to_string()
        };
        println!(
            "{:<12} {:>10.2} {:<12} {:>10.2} {:>6} {:>9.2}",
            trade.entry_date.to_string(),
            trade.entry_price,
            exit,
            trade.exit_price,
            trade.bars_held(),
            trade.trade_return * 100.0
        );
    }
}
