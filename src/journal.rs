//! Trade journal
//!
//! One flat record per registered trade. Money fields are `Decimal` so that
//! running PnL totals do not drift; they are rounded to cents, units to six
//! places.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::Path;
use tracing::info;

use crate::error::JournalError;
use crate::risk::TradePlan;
use crate::{Direction, Symbol};

const MONEY_DP: u32 = 2;
const UNITS_DP: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    Open,
    Closed,
}

fn to_decimal(field: &'static str, value: f64, dp: u32) -> Result<Decimal, JournalError> {
    Decimal::try_from(value)
        .map(|d| d.round_dp(dp))
        .map_err(|_| JournalError::NotRepresentable { field, value })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: NaiveDateTime,
    pub symbol: Symbol,
    pub direction: Direction,
    pub strategy_name: String,
    pub entry_price: Decimal,
    pub units: Decimal,
    pub invested_amount: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub status: TradeStatus,
    pub exit_price: Option<Decimal>,
    pub realized_pnl: Option<Decimal>,
}

impl JournalEntry {
    /// Register a new open trade from a sized plan
    pub fn open(
        timestamp: NaiveDateTime,
        symbol: Symbol,
        strategy_name: impl Into<String>,
        plan: &TradePlan,
    ) -> Result<Self, JournalError> {
        let entry_price = to_decimal("entry_price", plan.entry_price, MONEY_DP)?;
        let units = to_decimal("units", plan.position_size, UNITS_DP)?;

        Ok(Self {
            timestamp,
            symbol,
            direction: plan.direction,
            strategy_name: strategy_name.into(),
            entry_price,
            units,
            invested_amount: (entry_price * units).round_dp(MONEY_DP),
            stop_loss: to_decimal("stop_loss", plan.stop_loss, MONEY_DP)?,
            take_profit: to_decimal("take_profit", plan.take_profit, MONEY_DP)?,
            status: TradeStatus::Open,
            exit_price: None,
            realized_pnl: None,
        })
    }

    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    /// PnL if the trade were closed at `price`; inverted for shorts
    pub fn pnl_at(&self, price: Decimal) -> Decimal {
        let pnl = (price - self.entry_price) * self.units;
        let pnl = match self.direction {
            Direction::Long => pnl,
            Direction::Short => -pnl,
        };
        pnl.round_dp(MONEY_DP)
    }

    /// Close the trade at `exit_price` and return the realized PnL
    pub fn close(&mut self, exit_price: f64) -> Result<Decimal, JournalError> {
        if !self.is_open() {
            return Err(JournalError::AlreadyClosed {
                symbol: self.symbol.to_string(),
                timestamp: self.timestamp.to_string(),
            });
        }

        let exit = to_decimal("exit_price", exit_price, MONEY_DP)?;
        let pnl = self.pnl_at(exit);

        self.status = TradeStatus::Closed;
        self.exit_price = Some(exit);
        self.realized_pnl = Some(pnl);
        Ok(pnl)
    }
}

/// Aggregate statistics over closed trades
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalSummary {
    pub closed_trades: usize,
    pub open_trades: usize,
    pub total_pnl: Decimal,
    /// Percentage of closed trades with positive PnL
    pub win_rate: Decimal,
    pub best_trade: Option<Decimal>,
}

pub fn summarize(entries: &[JournalEntry]) -> JournalSummary {
    let closed: Vec<Decimal> = entries
        .iter()
        .filter(|e| e.status == TradeStatus::Closed)
        .filter_map(|e| e.realized_pnl)
        .collect();

    let wins = closed.iter().filter(|p| **p > Decimal::ZERO).count();
    let win_rate = if closed.is_empty() {
        Decimal::ZERO
    } else {
        (Decimal::from(wins) / Decimal::from(closed.len()) * dec!(100)).round_dp(MONEY_DP)
    };

    JournalSummary {
        closed_trades: closed.len(),
        open_trades: entries.iter().filter(|e| e.is_open()).count(),
        total_pnl: closed.iter().copied().sum(),
        win_rate,
        best_trade: closed.iter().copied().max(),
    }
}

/// Read all entries; a missing file is an empty journal
pub fn load(path: impl AsRef<Path>) -> Result<Vec<JournalEntry>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open journal {}", path.display()))?;
    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("Failed to read journal row {}", i + 1)))
        .collect()
}

/// Append one entry, writing the header when the file is new
pub fn append(path: impl AsRef<Path>, entry: &JournalEntry) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let is_new = !path.exists() || fs::metadata(path)?.len() == 0;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open journal {}", path.display()))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(is_new)
        .from_writer(file);
    writer.serialize(entry)?;
    writer.flush()?;

    info!("Journaled {} {} x {}", entry.direction, entry.symbol, entry.units);
    Ok(())
}

/// Rewrite the whole journal
pub fn save(path: impl AsRef<Path>, entries: &[JournalEntry]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to write journal {}", path.display()))?;
    for entry in entries {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    Ok(())
}

/// Close the open trade at `index` and persist the journal
pub fn close_at(path: impl AsRef<Path>, index: usize, exit_price: f64) -> Result<JournalEntry> {
    let path = path.as_ref();
    let mut entries = load(path)?;

    let entry = entries
        .get_mut(index)
        .filter(|e| e.is_open())
        .ok_or(JournalError::NoOpenTrade(index))?;
    let pnl = entry.close(exit_price)?;
    let closed = entry.clone();

    save(path, &entries)?;
    info!("Closed {} at {} (PnL {})", closed.symbol, exit_price, pnl);
    Ok(closed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn plan(direction: Direction, entry: f64) -> TradePlan {
        TradePlan {
            entry_price: entry,
            direction,
            stop_loss: entry - 4.0,
            take_profit: entry + 8.0,
            risk_per_unit: 4.0,
            position_size: 50.0,
            account_risk_amount: 200.0,
            atr: 2.0,
            rr_ratio: 2.0,
            invested_amount: entry * 50.0,
            potential_gain: 400.0,
        }
    }

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_long_close_pnl() {
        let mut entry =
            JournalEntry::open(at(), Symbol::new("SPY"), "Golden Cross", &plan(Direction::Long, 100.0))
                .unwrap();
        assert_eq!(entry.invested_amount, dec!(5000.00));

        let pnl = entry.close(104.5).unwrap();
        assert_eq!(pnl, dec!(225.00));
        assert_eq!(entry.status, TradeStatus::Closed);
        assert!(entry.close(110.0).is_err());
    }

    #[test]
    fn test_short_pnl_inverted() {
        let mut entry =
            JournalEntry::open(at(), Symbol::new("TSLA"), "MACD Momentum", &plan(Direction::Short, 100.0))
                .unwrap();
        assert_eq!(entry.close(90.0).unwrap(), dec!(500.00));
    }

    #[test]
    fn test_summary() {
        let mut a = JournalEntry::open(at(), Symbol::new("A"), "x", &plan(Direction::Long, 10.0)).unwrap();
        let mut b = JournalEntry::open(at(), Symbol::new("B"), "x", &plan(Direction::Long, 10.0)).unwrap();
        let c = JournalEntry::open(at(), Symbol::new("C"), "x", &plan(Direction::Long, 10.0)).unwrap();
        a.close(12.0).unwrap();
        b.close(9.0).unwrap();

        let summary = summarize(&[a, b, c]);
        assert_eq!(summary.closed_trades, 2);
        assert_eq!(summary.open_trades, 1);
        assert_eq!(summary.total_pnl, dec!(50.00));
        assert_eq!(summary.win_rate, dec!(50.00));
        assert_eq!(summary.best_trade, Some(dec!(100.00)));
    }

    #[test]
    fn test_csv_append_load_close() {
        let dir = std::env::temp_dir().join("strategy_scout_journal_test");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("journal.csv");

        let entry = JournalEntry::open(at(), Symbol::new("SPY"), "Golden Cross", &plan(Direction::Long, 100.0))
            .unwrap();
        append(&path, &entry).unwrap();
        append(&path, &entry).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], entry);

        let closed = close_at(&path, 1, 102.0).unwrap();
        assert_eq!(closed.realized_pnl, Some(dec!(100.00)));
        let reloaded = load(&path).unwrap();
        assert!(reloaded[0].is_open());
        assert_eq!(reloaded[1].status, TradeStatus::Closed);
        assert!(close_at(&path, 1, 103.0).is_err());
    }
}
