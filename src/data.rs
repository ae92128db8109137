//! Price data loading
//!
//! Reads daily OHLCV bars from CSV files laid out as `<data_dir>/<SYMBOL>.csv`
//! with a `date,open,high,low,close,volume` header.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::{Candle, PriceSeries, Symbol};

#[derive(Debug, Deserialize)]
struct CsvBar {
    #[serde(alias = "Date", alias = "datetime", alias = "Datetime")]
    date: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: f64,
}

/// Parse `YYYY-MM-DD`, also accepting a trailing time component
fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| {
            chrono::DateTime::parse_from_rfc3339(s).map(|dt| dt.date_naive())
        })
        .with_context(|| format!("Failed to parse date: {}", s))
}

/// Load every bar of one CSV file
pub fn load_csv(path: impl AsRef<Path>) -> Result<PriceSeries> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;

    let mut bars = Vec::new();
    for (row_idx, row) in reader.deserialize::<CsvBar>().enumerate() {
        let row = row.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        bars.push(Candle {
            date: parse_date(&row.date)?,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    PriceSeries::new(bars).with_context(|| format!("Invalid price data in {}", path.display()))
}

/// Path of a symbol's data file
pub fn symbol_path(data_dir: impl AsRef<Path>, symbol: &Symbol) -> PathBuf {
    data_dir.as_ref().join(format!("{}.csv", symbol.as_str()))
}

/// Load a symbol's series.
///
/// `Ok(None)` when the file does not exist or holds no bars; the caller
/// treats that as "cannot evaluate".
pub fn load_symbol(data_dir: impl AsRef<Path>, symbol: &Symbol) -> Result<Option<PriceSeries>> {
    let path = symbol_path(data_dir, symbol);

    if !path.exists() {
        warn!("Data file not found: {}", path.display());
        return Ok(None);
    }

    let series = load_csv(&path).with_context(|| format!("Failed to load data for {}", symbol))?;
    if series.is_empty() {
        warn!("Empty data file: {}", path.display());
        return Ok(None);
    }

    info!("Loaded {} bars for {}", series.len(), symbol);
    if let (Some(first), Some(last)) = (series.bars().first(), series.last()) {
        debug!("{}: {} .. {}", symbol, first.date, last.date);
    }
    Ok(Some(series))
}
