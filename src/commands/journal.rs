//! Journal command implementation

use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;
use tracing::info;

use strategy_scout::journal::{self, JournalEntry};
use strategy_scout::risk::RiskManager;
use strategy_scout::Direction;

use super::plan::build_plan;
use super::{banner, load_inputs};
use crate::JournalAction;

pub fn run(file: PathBuf, action: JournalAction) -> Result<()> {
    match action {
        JournalAction::Open {
            symbol,
            config,
            direction,
            entry,
            strategy,
        } => {
            let direction: Direction = direction.parse()?;
            let (config, symbol, series) = load_inputs(&config, &symbol)?;
            let risk = RiskManager::new(config.risk.clone())?;
            let plan = build_plan(&risk, &series, direction, entry)?;

            let strategy = strategy
                .or_else(|| config.strategy_map.get(&symbol).map(|s| s.name().to_string()))
                .unwrap_or_else(|| "Manual".to_string());

            let record = JournalEntry::open(Local::now().naive_local(), symbol, strategy, &plan)?;
            journal::append(&file, &record)?;
            println!(
                "Opened {} {} x {} at {} (stop {}, target {})",
                record.direction,
                record.symbol,
                record.units,
                record.entry_price,
                record.stop_loss,
                record.take_profit
            );
        }

        JournalAction::Close { index, exit } => {
            let closed = journal::close_at(&file, index, exit)?;
            println!(
                "Closed {} at {}: PnL {}",
                closed.symbol,
                exit,
                closed.realized_pnl.unwrap_or_default()
            );
        }

        JournalAction::List => {
            let entries = journal::load(&file)?;
            banner(&format!("JOURNAL: {}", file.display()));
            println!(
                "{:<4} {:<19} {:<9} {:<5} {:<20} {:>10} {:>12} {:<6} {:>10}",
                "#", "Opened", "Symbol", "Dir", "Strategy", "Entry", "Units", "Status", "PnL"
            );
            for (i, e) in entries.iter().enumerate() {
                println!(
                    "{:<4} {:<19} {:<9} {:<5} {:<20} {:>10} {:>12} {:<6} {:>10}",
                    i,
                    e.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    e.symbol,
                    e.direction,
                    e.strategy_name,
                    e.entry_price,
                    e.units,
                    format!("{:?}", e.status).to_uppercase(),
                    e.realized_pnl.map_or_else(|| "-".to_string(), |p| p.to_string())
                );
            }
            println!("{}", "=".repeat(70));
        }

        JournalAction::Summary => {
            let entries = journal::load(&file)?;
            let summary = journal::summarize(&entries);
            banner("JOURNAL SUMMARY");
            println!("Closed trades:      {}", summary.closed_trades);
            println!("Open trades:        {}", summary.open_trades);
            println!("Realized PnL:       {}", summary.total_pnl);
            println!("Win rate:           {}%", summary.win_rate);
            match summary.best_trade {
                Some(best) => println!("Best trade:         {}", best),
                None => println!("Best trade:         -"),
            }
            println!("{}", "=".repeat(70));
        }
    }

    info!("Journal command completed");
    Ok(())
}
