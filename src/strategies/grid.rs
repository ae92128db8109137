//! Per-family parameter grids for search mode
//!
//! Candidates come out in a fixed family order (the order of the fields
//! below) so that tie-breaking in the scout is reproducible.

use itertools::iproduct;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::*;

/// Which grid the scout searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridMode {
    /// The four classic families
    #[default]
    Quick,
    /// All ten families
    Full,
}

impl std::str::FromStr for GridMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "quick" => Ok(GridMode::Quick),
            "full" => Ok(GridMode::Full),
            other => Err(format!("unknown grid mode '{}' (expected quick or full)", other)),
        }
    }
}

/// Parameter values to try for each strategy family.
///
/// An empty vector disables the family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchGrid {
    pub trend_fast: Vec<usize>,
    pub trend_slow: Vec<usize>,
    pub rsi_low: Vec<f64>,
    pub rsi_high: Vec<f64>,
    pub bollinger_window: Vec<usize>,
    pub bollinger_std: Vec<f64>,
    pub macd: Vec<(usize, usize, usize)>,
    pub ema_fast: Vec<usize>,
    pub ema_slow: Vec<usize>,
    pub stoch_rsi_period: Vec<usize>,
    pub stoch_period: Vec<usize>,
    pub ao: Vec<(usize, usize)>,
    pub supertrend_period: Vec<usize>,
    pub supertrend_multiplier: Vec<f64>,
    pub squeeze_bb_len: Vec<usize>,
    pub adx_threshold: Vec<f64>,
}

impl SearchGrid {
    /// Golden Cross, RSI mean reversion, Bollinger breakout and MACD
    pub fn quick() -> Self {
        SearchGrid {
            trend_fast: vec![20, 50],
            trend_slow: vec![100, 200],
            rsi_low: vec![25.0, 30.0, 35.0],
            rsi_high: vec![60.0, 70.0, 80.0],
            bollinger_window: vec![20, 30],
            bollinger_std: vec![2.0, 2.5],
            macd: vec![(12, 26, 9), (8, 21, 5)],
            ema_fast: vec![],
            ema_slow: vec![],
            stoch_rsi_period: vec![],
            stoch_period: vec![],
            ao: vec![],
            supertrend_period: vec![],
            supertrend_multiplier: vec![],
            squeeze_bb_len: vec![],
            adx_threshold: vec![],
        }
    }

    /// Every family
    pub fn full() -> Self {
        SearchGrid {
            ema_fast: vec![5, 8, 9],
            ema_slow: vec![13, 21],
            stoch_rsi_period: vec![9, 14],
            stoch_period: vec![9, 14],
            ao: vec![(5, 34), (3, 10)],
            supertrend_period: vec![7, 10],
            supertrend_multiplier: vec![2.0, 3.0],
            squeeze_bb_len: vec![14, 20],
            adx_threshold: vec![20.0, 25.0, 30.0],
            ..Self::quick()
        }
    }

    pub fn for_mode(mode: GridMode) -> Self {
        match mode {
            GridMode::Quick => Self::quick(),
            GridMode::Full => Self::full(),
        }
    }

    /// Enumerate every valid candidate, family by family.
    ///
    /// Combinations that fail parameter validation (e.g. fast >= slow) are
    /// skipped.
    pub fn candidates(&self) -> Vec<StrategySpec> {
        let trend = iproduct!(&self.trend_fast, &self.trend_slow).map(|(&fast, &slow)| {
            StrategySpec::TrendCrossover(TrendCrossoverParams { fast, slow })
        });

        let mean_reversion = iproduct!(&self.rsi_low, &self.rsi_high).map(|(&low, &high)| {
            StrategySpec::MeanReversion(MeanReversionParams {
                low,
                high,
                ..Default::default()
            })
        });

        let bollinger = iproduct!(&self.bollinger_window, &self.bollinger_std).map(
            |(&window, &std_dev)| {
                StrategySpec::BollingerBreakout(BollingerBreakoutParams { window, std_dev })
            },
        );

        let macd = self.macd.iter().map(|&(fast, slow, signal)| {
            StrategySpec::MacdMomentum(MacdMomentumParams { fast, slow, signal })
        });

        let ema = iproduct!(&self.ema_fast, &self.ema_slow)
            .map(|(&fast, &slow)| StrategySpec::EmaCrossover(EmaCrossoverParams { fast, slow }));

        let stoch = iproduct!(&self.stoch_rsi_period, &self.stoch_period).map(
            |(&rsi_period, &stoch_period)| {
                StrategySpec::StochasticRsi(StochasticRsiParams {
                    rsi_period,
                    stoch_period,
                    ..Default::default()
                })
            },
        );

        let ao = self.ao.iter().map(|&(fast, slow)| {
            StrategySpec::AwesomeOscillator(AwesomeOscillatorParams { fast, slow })
        });

        let supertrend = iproduct!(&self.supertrend_period, &self.supertrend_multiplier).map(
            |(&period, &multiplier)| StrategySpec::SuperTrend(SuperTrendParams { period, multiplier }),
        );

        let squeeze = self.squeeze_bb_len.iter().map(|&bb_len| {
            StrategySpec::SqueezeMomentum(SqueezeMomentumParams {
                bb_len,
                kc_len: bb_len,
                ..Default::default()
            })
        });

        let adx = self.adx_threshold.iter().map(|&adx_threshold| {
            StrategySpec::AdxTrend(AdxTrendParams {
                adx_threshold,
                ..Default::default()
            })
        });

        trend
            .chain(mean_reversion)
            .chain(bollinger)
            .chain(macd)
            .chain(ema)
            .chain(stoch)
            .chain(ao)
            .chain(supertrend)
            .chain(squeeze)
            .chain(adx)
            .filter(|spec| match spec.validate() {
                Ok(()) => true,
                Err(e) => {
                    debug!("Skipping grid candidate: {}", e);
                    false
                }
            })
            .collect()
    }

    /// Number of valid candidates
    pub fn total_combinations(&self) -> usize {
        self.candidates().len()
    }
}

impl Default for SearchGrid {
    fn default() -> Self {
        Self::quick()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quick_grid_size_and_order() {
        let candidates = SearchGrid::quick().candidates();
        // 4 golden cross + 9 RSI + 4 Bollinger + 2 MACD
        assert_eq!(candidates.len(), 19);
        assert_eq!(
            candidates[0],
            StrategySpec::TrendCrossover(TrendCrossoverParams { fast: 20, slow: 100 })
        );
        assert_eq!(candidates[18].name(), macd_momentum::NAME);
    }

    #[test]
    fn test_full_grid_covers_every_family() {
        let candidates = SearchGrid::full().candidates();
        let mut names: Vec<&str> = candidates.iter().map(StrategySpec::name).collect();
        names.dedup();
        assert_eq!(names.len(), 10);
        // 19 + 6 EMA + 4 StochRSI + 2 AO + 4 SuperTrend + 2 squeeze + 3 ADX
        assert_eq!(candidates.len(), 40);
    }

    #[test]
    fn test_invalid_combinations_skipped() {
        let grid = SearchGrid {
            trend_fast: vec![50, 200],
            trend_slow: vec![100],
            ..SearchGrid::quick()
        };
        let trend: Vec<_> = grid
            .candidates()
            .into_iter()
            .filter(|c| matches!(c, StrategySpec::TrendCrossover(_)))
            .collect();
        assert_eq!(trend.len(), 1);
    }

    #[test]
    fn test_grid_mode_parse() {
        assert_eq!("FULL".parse::<GridMode>().unwrap(), GridMode::Full);
        assert!("huge".parse::<GridMode>().is_err());
    }
}
