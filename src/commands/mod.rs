pub mod backtest;
pub mod journal;
pub mod optimize;
pub mod plan;
pub mod scan;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use strategy_scout::{data, Config, PriceSeries, Symbol};

/// Load the config and one symbol's series, failing if there is no data
pub(crate) fn load_inputs(config_path: &Path, symbol: &str) -> Result<(Config, Symbol, PriceSeries)> {
    let config = Config::load_or_default(Some(config_path))?;
    info!("Data directory: {}", config.data_dir.display());

    let symbol = Symbol::new(symbol);
    let series = data::load_symbol(&config.data_dir, &symbol)?.with_context(|| {
        format!(
            "No price data for {} (expected {})",
            symbol,
            data::symbol_path(&config.data_dir, &symbol).display()
        )
    })?;

    Ok((config, symbol, series))
}

pub(crate) fn banner(title: &str) {
    println!("\n{}", "=".repeat(70));
    println!("{}", title);
    println!("{}", "=".repeat(70));
}
