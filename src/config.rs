//! Configuration management
//!
//! A JSON file loaded once at startup and passed by reference from then on.
//! Every section is optional; missing sections fall back to the built-in
//! defaults, including the strategy map for the default ticker universe.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::risk::RiskConfig;
use crate::scout::ScoutConfig;
use crate::strategies::{
    AwesomeOscillatorParams, BollingerBreakoutParams, EmaCrossoverParams, MacdMomentumParams,
    MeanReversionParams, StochasticRsiParams, StrategySpec, TrendCrossoverParams,
};
use crate::Symbol;

/// Environment variable overriding `data_dir`
pub const DATA_DIR_ENV: &str = "SCOUT_DATA_DIR";
/// Environment variable overriding `risk.account_size`
pub const ACCOUNT_SIZE_ENV: &str = "SCOUT_ACCOUNT_SIZE";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `<SYMBOL>.csv` price files
    pub data_dir: PathBuf,
    /// Where scan reports are written
    pub results_dir: PathBuf,
    /// Instrument universe for scans
    pub tickers: Vec<Symbol>,
    pub scout: ScoutConfig,
    pub risk: RiskConfig,
    /// Known-good strategy per instrument (lookup fast path)
    pub strategy_map: BTreeMap<Symbol, StrategySpec>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("data"),
            results_dir: PathBuf::from("results"),
            tickers: default_tickers(),
            scout: ScoutConfig::default(),
            risk: RiskConfig::default(),
            strategy_map: default_strategy_map(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given and present, otherwise the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::from_file(p),
            Some(p) => {
                info!("Config file {} not found, using defaults", p.display());
                Self::defaults_with_env()
            }
            None => Self::defaults_with_env(),
        }
    }

    fn defaults_with_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(size) = std::env::var(ACCOUNT_SIZE_ENV) {
            self.risk.account_size = size
                .trim()
                .parse()
                .with_context(|| format!("{} is not a number: {}", ACCOUNT_SIZE_ENV, size))?;
        }
        Ok(())
    }

    /// Reject configurations the scout or risk manager cannot run with
    pub fn validate(&self) -> Result<()> {
        self.risk.validate().context("Invalid risk configuration")?;

        let limit = self.scout.max_drawdown_limit;
        if !(limit > 0.0 && limit <= 1.0) {
            anyhow::bail!("scout.max_drawdown_limit must be in (0, 1], got {}", limit);
        }

        for (symbol, spec) in &self.strategy_map {
            spec.validate()
                .with_context(|| format!("Invalid strategy_map entry for {}", symbol))?;
        }

        Ok(())
    }
}

fn default_tickers() -> Vec<Symbol> {
    [
        "SPY", "QQQ", "DIA", "BTC-USD", "ETH-USD", "SOL-USD", "MSFT", "AAPL", "NVDA", "GOOGL",
        "META", "NFLX", "AMZN", "TSLA", "HD", "JPM", "V", "MA", "LLY", "UNH", "JNJ", "WMT", "PG",
        "COST", "XOM", "CVX", "COP", "CAT", "UNP", "GE", "LIN", "NEE", "SHW",
    ]
    .iter()
    .map(Symbol::new)
    .collect()
}

/// Built-in strategy table for the default universe
pub fn default_strategy_map() -> BTreeMap<Symbol, StrategySpec> {
    let golden = |fast, slow| StrategySpec::TrendCrossover(TrendCrossoverParams { fast, slow });
    let ema = |fast, slow| StrategySpec::EmaCrossover(EmaCrossoverParams { fast, slow });
    let rsi = |low, high| {
        StrategySpec::MeanReversion(MeanReversionParams {
            low,
            high,
            ..Default::default()
        })
    };
    let bollinger = StrategySpec::BollingerBreakout(BollingerBreakoutParams {
        window: 20,
        std_dev: 2.0,
    });
    let macd = StrategySpec::MacdMomentum(MacdMomentumParams::default());
    let ao = |fast, slow| StrategySpec::AwesomeOscillator(AwesomeOscillatorParams { fast, slow });
    let stoch = StrategySpec::StochasticRsi(StochasticRsiParams {
        rsi_period: 9,
        stoch_period: 9,
        k_period: 3,
        d_period: 3,
    });

    [
        ("SPY", ema(9, 21)),
        ("QQQ", golden(50, 100)),
        ("DIA", rsi(30.0, 60.0)),
        ("BTC-USD", ema(8, 21)),
        ("ETH-USD", ema(5, 13)),
        ("SOL-USD", bollinger),
        ("MSFT", ao(3, 10)),
        ("AAPL", stoch),
        ("NVDA", golden(50, 100)),
        ("GOOGL", golden(50, 100)),
        ("META", golden(20, 100)),
        ("NFLX", golden(50, 100)),
        ("AMZN", stoch),
        ("TSLA", macd),
        ("HD", stoch),
        ("JPM", golden(20, 200)),
        ("V", rsi(30.0, 60.0)),
        ("MA", rsi(30.0, 70.0)),
        ("LLY", stoch),
        ("UNH", rsi(25.0, 70.0)),
        ("JNJ", macd),
        ("WMT", golden(20, 200)),
        ("PG", macd),
        ("COST", ao(5, 34)),
        ("XOM", rsi(30.0, 70.0)),
        ("CVX", rsi(30.0, 70.0)),
        ("COP", rsi(30.0, 60.0)),
        ("CAT", ema(5, 13)),
        ("UNP", rsi(30.0, 60.0)),
        ("GE", golden(50, 200)),
        ("LIN", macd),
        ("NEE", ema(5, 13)),
        ("SHW", bollinger),
    ]
    .into_iter()
    .map(|(symbol, spec)| (Symbol::new(symbol), spec))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scout::ScoringPolicy;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.tickers.len(), 33);
        assert_eq!(config.strategy_map.len(), 33);
        assert!(config
            .tickers
            .iter()
            .all(|t| config.strategy_map.contains_key(t)));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(
            r#"{
                "data_dir": "prices",
                "scout": { "scoring": "risk_adjusted" },
                "risk": { "account_size": 5000.0 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("prices"));
        assert_eq!(config.scout.scoring, ScoringPolicy::RiskAdjusted);
        assert_eq!(config.scout.max_drawdown_limit, 0.60);
        assert_eq!(config.risk.account_size, 5000.0);
        assert_eq!(config.risk.risk_per_trade, 0.02);
    }

    #[test]
    fn test_validate_rejects_bad_map_entry() {
        let mut config = Config::default();
        config.strategy_map.insert(
            Symbol::new("XYZ"),
            StrategySpec::TrendCrossover(TrendCrossoverParams { fast: 200, slow: 50 }),
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_risky_fraction() {
        let mut config = Config::default();
        config.risk.risk_per_trade = 0.2;
        assert!(config.validate().is_err());
    }
}
