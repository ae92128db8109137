//! Trading Strategies Module
//!
//! A closed family of signal rules. Every variant of [`StrategySpec`] carries
//! its own parameter struct and maps a [`PriceSeries`] to a per-bar
//! [`Signal`]. Generation is a pure function of (series, params): no state
//! survives between calls.

pub mod adx_trend;
pub mod awesome_oscillator;
pub mod bollinger_breakout;
pub mod ema_crossover;
pub mod grid;
pub mod macd_momentum;
pub mod mean_reversion;
pub mod squeeze_momentum;
pub mod stochastic_rsi;
pub mod supertrend;
pub mod trend_crossover;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ParamError;
use crate::{PriceSeries, Signal};

pub use adx_trend::AdxTrendParams;
pub use awesome_oscillator::AwesomeOscillatorParams;
pub use bollinger_breakout::BollingerBreakoutParams;
pub use ema_crossover::EmaCrossoverParams;
pub use grid::{GridMode, SearchGrid};
pub use macd_momentum::MacdMomentumParams;
pub use mean_reversion::MeanReversionParams;
pub use squeeze_momentum::SqueezeMomentumParams;
pub use stochastic_rsi::StochasticRsiParams;
pub use supertrend::SuperTrendParams;
pub use trend_crossover::TrendCrossoverParams;

/// Signal column plus the indicator columns that produced it.
///
/// `columns` holds the derived views a chart overlay needs (moving averages,
/// bands, oscillators), keyed by column name and aligned with the series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalFrame {
    pub signals: Vec<Signal>,
    /// +1 / -1 trend direction, for strategies that track one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Vec<i8>>,
    pub columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl SignalFrame {
    /// All-flat frame, used whenever there is not enough history
    pub fn flat(len: usize) -> Self {
        Self {
            signals: vec![Signal::Flat; len],
            trend: None,
            columns: BTreeMap::new(),
        }
    }

    pub fn new(signals: Vec<Signal>) -> Self {
        Self {
            signals,
            trend: None,
            columns: BTreeMap::new(),
        }
    }

    pub fn with_column(mut self, name: &str, values: Vec<Option<f64>>) -> Self {
        self.columns.insert(name.to_string(), values);
        self
    }

    pub fn with_trend(mut self, trend: Vec<i8>) -> Self {
        self.trend = Some(trend);
        self
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Signal on the most recent bar
    pub fn last_signal(&self) -> Signal {
        self.signals.last().copied().unwrap_or_default()
    }

    /// Signal on the bar before the most recent one
    pub fn previous_signal(&self) -> Signal {
        self.signals
            .len()
            .checked_sub(2)
            .map(|i| self.signals[i])
            .unwrap_or_default()
    }
}

/// Long wherever `fast > slow` with both sides defined
pub(crate) fn long_while_above(fast: &[Option<f64>], slow: &[Option<f64>]) -> Vec<Signal> {
    fast.iter()
        .zip(slow)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Signal::from(f > s),
            _ => Signal::Flat,
        })
        .collect()
}

/// Two-state position machine.
///
/// Each element is `(enter, exit)` for one bar. FLAT moves to LONG on `enter`,
/// LONG moves to FLAT on `exit`, and any other bar keeps the current state.
pub(crate) fn hysteresis<I>(conditions: I) -> Vec<Signal>
where
    I: IntoIterator<Item = (bool, bool)>,
{
    conditions
        .into_iter()
        .scan(Signal::Flat, |state, (enter, exit)| {
            *state = match *state {
                Signal::Flat if enter => Signal::Long,
                Signal::Long if exit => Signal::Flat,
                current => current,
            };
            Some(*state)
        })
        .collect()
}

/// A strategy kind together with its parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "params", rename_all = "snake_case")]
pub enum StrategySpec {
    TrendCrossover(TrendCrossoverParams),
    MeanReversion(MeanReversionParams),
    BollingerBreakout(BollingerBreakoutParams),
    MacdMomentum(MacdMomentumParams),
    EmaCrossover(EmaCrossoverParams),
    StochasticRsi(StochasticRsiParams),
    AwesomeOscillator(AwesomeOscillatorParams),
    SuperTrend(SuperTrendParams),
    SqueezeMomentum(SqueezeMomentumParams),
    AdxTrend(AdxTrendParams),
}

impl StrategySpec {
    /// Human-readable strategy name
    pub fn name(&self) -> &'static str {
        match self {
            StrategySpec::TrendCrossover(_) => trend_crossover::NAME,
            StrategySpec::MeanReversion(_) => mean_reversion::NAME,
            StrategySpec::BollingerBreakout(_) => bollinger_breakout::NAME,
            StrategySpec::MacdMomentum(_) => macd_momentum::NAME,
            StrategySpec::EmaCrossover(_) => ema_crossover::NAME,
            StrategySpec::StochasticRsi(_) => stochastic_rsi::NAME,
            StrategySpec::AwesomeOscillator(_) => awesome_oscillator::NAME,
            StrategySpec::SuperTrend(_) => supertrend::NAME,
            StrategySpec::SqueezeMomentum(_) => squeeze_momentum::NAME,
            StrategySpec::AdxTrend(_) => adx_trend::NAME,
        }
    }

    /// Largest window among the parameters; shorter series produce no signal
    pub fn lookback(&self) -> usize {
        match self {
            StrategySpec::TrendCrossover(p) => p.lookback(),
            StrategySpec::MeanReversion(p) => p.lookback(),
            StrategySpec::BollingerBreakout(p) => p.lookback(),
            StrategySpec::MacdMomentum(p) => p.lookback(),
            StrategySpec::EmaCrossover(p) => p.lookback(),
            StrategySpec::StochasticRsi(p) => p.lookback(),
            StrategySpec::AwesomeOscillator(p) => p.lookback(),
            StrategySpec::SuperTrend(p) => p.lookback(),
            StrategySpec::SqueezeMomentum(p) => p.lookback(),
            StrategySpec::AdxTrend(p) => p.lookback(),
        }
    }

    pub fn validate(&self) -> Result<(), ParamError> {
        match self {
            StrategySpec::TrendCrossover(p) => p.validate(),
            StrategySpec::MeanReversion(p) => p.validate(),
            StrategySpec::BollingerBreakout(p) => p.validate(),
            StrategySpec::MacdMomentum(p) => p.validate(),
            StrategySpec::EmaCrossover(p) => p.validate(),
            StrategySpec::StochasticRsi(p) => p.validate(),
            StrategySpec::AwesomeOscillator(p) => p.validate(),
            StrategySpec::SuperTrend(p) => p.validate(),
            StrategySpec::SqueezeMomentum(p) => p.validate(),
            StrategySpec::AdxTrend(p) => p.validate(),
        }
    }

    /// Flat name → value view of the parameters, for reports
    pub fn params_map(&self) -> BTreeMap<String, f64> {
        let pairs = match self {
            StrategySpec::TrendCrossover(p) => p.params(),
            StrategySpec::MeanReversion(p) => p.params(),
            StrategySpec::BollingerBreakout(p) => p.params(),
            StrategySpec::MacdMomentum(p) => p.params(),
            StrategySpec::EmaCrossover(p) => p.params(),
            StrategySpec::StochasticRsi(p) => p.params(),
            StrategySpec::AwesomeOscillator(p) => p.params(),
            StrategySpec::SuperTrend(p) => p.params(),
            StrategySpec::SqueezeMomentum(p) => p.params(),
            StrategySpec::AdxTrend(p) => p.params(),
        };
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    /// Generate the per-bar signal for `series`.
    ///
    /// Empty series and series shorter than [`lookback`](Self::lookback)
    /// come back all flat.
    pub fn generate_signals(&self, series: &PriceSeries) -> SignalFrame {
        if series.is_empty() || series.len() < self.lookback() {
            return SignalFrame::flat(series.len());
        }

        match self {
            StrategySpec::TrendCrossover(p) => p.generate(series),
            StrategySpec::MeanReversion(p) => p.generate(series),
            StrategySpec::BollingerBreakout(p) => p.generate(series),
            StrategySpec::MacdMomentum(p) => p.generate(series),
            StrategySpec::EmaCrossover(p) => p.generate(series),
            StrategySpec::StochasticRsi(p) => p.generate(series),
            StrategySpec::AwesomeOscillator(p) => p.generate(series),
            StrategySpec::SuperTrend(p) => p.generate(series),
            StrategySpec::SqueezeMomentum(p) => p.generate(series),
            StrategySpec::AdxTrend(p) => p.generate(series),
        }
    }
}

impl fmt::Display for StrategySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .params_map()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{} ({})", self.name(), params)
    }
}

pub(crate) fn check_period(
    strategy: &'static str,
    name: &'static str,
    value: usize,
) -> Result<(), ParamError> {
    if value == 0 {
        return Err(ParamError::ZeroPeriod { strategy, name });
    }
    Ok(())
}

pub(crate) fn check_fast_slow(
    strategy: &'static str,
    fast: usize,
    slow: usize,
) -> Result<(), ParamError> {
    check_period(strategy, "fast", fast)?;
    check_period(strategy, "slow", slow)?;
    if fast >= slow {
        return Err(ParamError::FastNotBelowSlow {
            strategy,
            fast,
            slow,
        });
    }
    Ok(())
}

pub(crate) fn check_positive(
    strategy: &'static str,
    name: &'static str,
    value: f64,
) -> Result<(), ParamError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ParamError::NonPositive {
            strategy,
            name,
            value,
        });
    }
    Ok(())
}
