//! Strategy selection
//!
//! The scout picks one (strategy, parameters) pair per instrument. Known
//! instruments take the lookup fast path through the configured strategy
//! map; everything else, and any lookup candidate that fails the drawdown
//! filter, goes through an exhaustive grid search.

use indicatif::ProgressBar;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::backtest::{self, BacktestResult};
use crate::strategies::{GridMode, SearchGrid, StrategySpec};
use crate::{PriceSeries, Symbol};

/// How candidates are ranked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// Total return only
    #[default]
    Return,
    /// `total_return + 0.1 * sharpe - 0.5 * |max_drawdown|`
    RiskAdjusted,
}

impl ScoringPolicy {
    pub fn score(&self, result: &BacktestResult) -> f64 {
        match self {
            ScoringPolicy::Return => result.total_return,
            ScoringPolicy::RiskAdjusted => {
                result.total_return + 0.1 * result.sharpe_ratio - 0.5 * result.max_drawdown.abs()
            }
        }
    }
}

impl std::str::FromStr for ScoringPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "return" => Ok(ScoringPolicy::Return),
            "risk_adjusted" => Ok(ScoringPolicy::RiskAdjusted),
            other => Err(format!(
                "unknown scoring policy '{}' (expected return or risk_adjusted)",
                other
            )),
        }
    }
}

/// Scout settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    pub scoring: ScoringPolicy,
    /// Candidates losing more than this fraction peak-to-trough are disqualified
    pub max_drawdown_limit: f64,
    pub grid: GridMode,
    /// Consult the strategy map before searching
    pub use_strategy_map: bool,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringPolicy::Return,
            max_drawdown_limit: 0.60,
            grid: GridMode::Quick,
            use_strategy_map: true,
        }
    }
}

/// How the winner was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    Lookup,
    Search,
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMode::Lookup => f.pad("lookup"),
            SelectionMode::Search => f.pad("search"),
        }
    }
}

/// Selected strategy for one instrument
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Winner {
    pub symbol: Symbol,
    pub strategy: String,
    pub spec: StrategySpec,
    pub params: BTreeMap<String, f64>,
    pub score: f64,
    pub mode: SelectionMode,
    pub result: BacktestResult,
}

impl Winner {
    fn new(
        symbol: &Symbol,
        spec: StrategySpec,
        result: BacktestResult,
        score: f64,
        mode: SelectionMode,
    ) -> Self {
        Self {
            symbol: symbol.clone(),
            strategy: spec.name().to_string(),
            params: spec.params_map(),
            spec,
            score,
            mode,
            result,
        }
    }
}

/// Outcome of scanning one instrument
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    Selected(Winner),
    NoSafeStrategy,
    NoData,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanRow {
    pub symbol: Symbol,
    pub outcome: ScanOutcome,
}

impl ScanRow {
    pub fn winner(&self) -> Option<&Winner> {
        match &self.outcome {
            ScanOutcome::Selected(w) => Some(w),
            _ => None,
        }
    }

    fn rank_key(&self) -> OrderedFloat<f64> {
        OrderedFloat(self.winner().map_or(f64::NEG_INFINITY, |w| w.score))
    }
}

/// Strategy selector for a fixed configuration
#[derive(Debug, Clone)]
pub struct Scout {
    config: ScoutConfig,
    strategy_map: BTreeMap<Symbol, StrategySpec>,
    grid: SearchGrid,
}

impl Scout {
    pub fn new(config: ScoutConfig, strategy_map: BTreeMap<Symbol, StrategySpec>) -> Self {
        let grid = SearchGrid::for_mode(config.grid);
        Self {
            config,
            strategy_map,
            grid,
        }
    }

    /// Replace the search grid
    pub fn with_grid(mut self, grid: SearchGrid) -> Self {
        self.grid = grid;
        self
    }

    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    pub fn grid(&self) -> &SearchGrid {
        &self.grid
    }

    /// Drawdown worse than the configured limit
    pub fn is_disqualified(&self, result: &BacktestResult) -> bool {
        result.max_drawdown < -self.config.max_drawdown_limit
    }

    /// Score of a candidate that may win, `None` otherwise
    fn eligible_score(&self, result: &BacktestResult) -> Option<f64> {
        if self.is_disqualified(result) {
            return None;
        }
        let score = self.config.scoring.score(result);
        score.is_finite().then_some(score)
    }

    /// Select the best strategy for `symbol`.
    ///
    /// `None` means no candidate survived the drawdown filter (or the series
    /// is too short to evaluate anything).
    pub fn optimize(&self, symbol: &Symbol, series: &PriceSeries) -> Option<Winner> {
        info!(
            "Optimizing {} over {} bars ({:?} scoring, drawdown limit {:.0}%)",
            symbol,
            series.len(),
            self.config.scoring,
            self.config.max_drawdown_limit * 100.0
        );

        if self.config.use_strategy_map {
            if let Some(winner) = self.lookup(symbol, series) {
                return Some(winner);
            }
        }

        self.search(symbol, series)
    }

    /// Single backtest of the mapped strategy, if any, and if it passes the filter
    pub fn lookup(&self, symbol: &Symbol, series: &PriceSeries) -> Option<Winner> {
        let spec = *self.strategy_map.get(symbol)?;

        if let Err(e) = spec.validate() {
            warn!("Ignoring mapped strategy for {}: {}", symbol, e);
            return None;
        }

        let result = backtest::run(series, &spec);
        match self.eligible_score(&result) {
            Some(score) => {
                info!(
                    "{}: lookup hit {} (return {:.2}%)",
                    symbol,
                    spec,
                    result.total_return * 100.0
                );
                Some(Winner::new(symbol, spec, result, score, SelectionMode::Lookup))
            }
            None => {
                info!(
                    "{}: mapped {} rejected (drawdown {:.2}%), falling back to search",
                    symbol,
                    spec,
                    result.max_drawdown * 100.0
                );
                None
            }
        }
    }

    /// Backtest every grid candidate and keep the best eligible score.
    ///
    /// Ties keep the earlier candidate.
    pub fn search(&self, symbol: &Symbol, series: &PriceSeries) -> Option<Winner> {
        let mut best: Option<(StrategySpec, BacktestResult, f64)> = None;

        for spec in self.grid.candidates() {
            let result = backtest::run(series, &spec);
            let score = self.eligible_score(&result);
            debug!(
                "{}: {} return={:.4} sharpe={:.3} dd={:.4} score={:?}",
                symbol,
                spec,
                result.total_return,
                result.sharpe_ratio,
                result.max_drawdown,
                score
            );

            let Some(score) = score else {
                continue;
            };
            let better = best.as_ref().map_or(true, |(_, _, s)| score > *s);
            if better {
                best = Some((spec, result, score));
            }
        }

        match best {
            Some((spec, result, score)) => {
                info!("{}: winner {} (score {:.4})", symbol, spec, score);
                Some(Winner::new(symbol, spec, result, score, SelectionMode::Search))
            }
            None => {
                info!("{}: no safe strategy found", symbol);
                None
            }
        }
    }

    /// Optimize many instruments in parallel.
    ///
    /// Each instrument is loaded and evaluated independently on the rayon
    /// pool. Rows come back sorted by score, best first; instruments without
    /// a winner sort last.
    pub fn scan<F>(&self, symbols: &[Symbol], loader: F, progress: &ProgressBar) -> Vec<ScanRow>
    where
        F: Fn(&Symbol) -> anyhow::Result<Option<PriceSeries>> + Sync,
    {
        let mut rows: Vec<ScanRow> = symbols
            .par_iter()
            .map(|symbol| {
                let outcome = match loader(symbol) {
                    Ok(Some(series)) => match self.optimize(symbol, &series) {
                        Some(winner) => ScanOutcome::Selected(winner),
                        None => ScanOutcome::NoSafeStrategy,
                    },
                    Ok(None) => {
                        warn!("No price data for {}", symbol);
                        ScanOutcome::NoData
                    }
                    Err(e) => {
                        warn!("Failed to load {}: {:#}", symbol, e);
                        ScanOutcome::Failed {
                            error: format!("{:#}", e),
                        }
                    }
                };
                progress.inc(1);
                progress.set_message(symbol.to_string());
                ScanRow {
                    symbol: symbol.clone(),
                    outcome,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            b.rank_key()
                .cmp(&a.rank_key())
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        rows
    }
}
