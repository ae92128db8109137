//! Scan command implementation

use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use strategy_scout::advisor::{self, Action};
use strategy_scout::risk::RiskManager;
use strategy_scout::scout::{ScanOutcome, ScanRow, Scout};
use strategy_scout::strategies::GridMode;
use strategy_scout::{data, Config, Symbol};

pub fn run(
    config_path: PathBuf,
    mode_override: Option<String>,
    tickers_override: Option<String>,
    top: usize,
    output: Option<PathBuf>,
) -> Result<()> {
    info!("Starting scan");

    let mut config = Config::load_or_default(Some(config_path.as_path()))?;
    if let Some(mode) = mode_override {
        config.scout.grid = mode.parse::<GridMode>().map_err(|e| anyhow!(e))?;
    }
    if let Some(tickers) = tickers_override {
        config.tickers = tickers
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(Symbol::new)
            .collect();
    }

    let scout = Scout::new(config.scout.clone(), config.strategy_map.clone());
    let risk = RiskManager::new(config.risk.clone())?;

    println!("\n{}", "=".repeat(70));
    println!("STRATEGY SCAN");
    println!("{}", "=".repeat(70));
    println!("  Tickers:       {}", config.tickers.len());
    println!("  Grid:          {:?} ({} candidates)", config.scout.grid, scout.grid().total_combinations());
    println!("  Scoring:       {:?}", config.scout.scoring);
    println!("  Max drawdown:  {:.0}%", config.scout.max_drawdown_limit * 100.0);
    println!("  Data dir:      {}", config.data_dir.display());
    println!("{}\n", "=".repeat(70));

    let pb = ProgressBar::new(config.tickers.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("⚡ {percent:>3}%|{bar:40}| {pos}/{len} [{elapsed}<{eta}, {per_sec:.2}] ✓ {msg}")?
            .progress_chars("█░ "),
    );

    let data_dir = config.data_dir.clone();
    let rows = scout.scan(
        &config.tickers,
        |symbol| data::load_symbol(&data_dir, symbol),
        &pb,
    );
    pb.finish_with_message(format!("{} scanned", rows.len()));
    println!();

    print_rows(&rows, top, &config, &risk);

    let output = match output {
        Some(path) => path,
        None => config.results_dir.join(format!(
            "scan_{}.json",
            chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
        )),
    };
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, serde_json::to_string_pretty(&rows)?)
        .with_context(|| format!("Failed to write report {}", output.display()))?;
    println!("Report written to {}", output.display());

    info!("Scan completed successfully");
    Ok(())
}

fn print_rows(rows: &[ScanRow], top: usize, config: &Config, risk: &RiskManager) {
    println!("\n{}", "=".repeat(110));
    println!("TOP {} INSTRUMENTS", top.min(rows.len()));
    println!("{}", "=".repeat(110));
    println!(
        "{:<4} {:<9} {:<20} {:>8} {:>9} {:>9} {:>7} {:<6} | {:<9} {:>10}",
        "Rank", "Symbol", "Strategy", "Score", "Return%", "B&H%", "MaxDD%", "Mode", "Action", "Stop"
    );
    println!("{}", "-".repeat(110));

    for (i, row) in rows.iter().take(top).enumerate() {
        match &row.outcome {
            ScanOutcome::Selected(winner) => {
                let advice = data::load_symbol(&config.data_dir, &row.symbol)
                    .ok()
                    .flatten()
                    .and_then(|series| advisor::advise(winner, &series, risk));
                let action = advice.as_ref().map_or(Action::StayOut, |a| a.action);
                let stop = advice
                    .as_ref()
                    .and_then(|a| a.plan.as_ref())
                    .map_or_else(|| "-".to_string(), |p| format!("{:.2}", p.stop_loss));

                println!(
                    "{:<4} {:<9} {:<20} {:>8.4} {:>9.2} {:>9.2} {:>7.2} {:<6} | {:<9} {:>10}",
                    i + 1,
                    row.symbol,
                    winner.strategy,
                    winner.score,
                    winner.result.total_return * 100.0,
                    winner.result.benchmark_return * 100.0,
                    winner.result.max_drawdown * 100.0,
                    winner.mode,
                    action,
                    stop
                );
            }
            ScanOutcome::NoSafeStrategy => {
                println!("{:<4} {:<9} no safe strategy found", i + 1, row.symbol)
            }
            ScanOutcome::NoData => println!("{:<4} {:<9} no data", i + 1, row.symbol),
            ScanOutcome::Failed { error } => {
                println!("{:<4} {:<9} error: {}", i + 1, row.symbol, error)
            }
        }
    }
    println!("{}", "=".repeat(110));
}
