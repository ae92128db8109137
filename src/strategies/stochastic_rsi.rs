//! Stochastic RSI: long while %K is above %D

use serde::{Deserialize, Serialize};

use super::{check_period, long_while_above, SignalFrame};
use crate::error::ParamError;
use crate::indicators::stochastic_rsi;
use crate::PriceSeries;

pub const NAME: &str = "Stochastic RSI";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticRsiParams {
    pub rsi_period: usize,
    pub stoch_period: usize,
    pub k_period: usize,
    pub d_period: usize,
}

impl Default for StochasticRsiParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            stoch_period: 14,
            k_period: 3,
            d_period: 3,
        }
    }
}

impl StochasticRsiParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        check_period(NAME, "rsi_period", self.rsi_period)?;
        check_period(NAME, "stoch_period", self.stoch_period)?;
        check_period(NAME, "k_period", self.k_period)?;
        check_period(NAME, "d_period", self.d_period)
    }

    pub fn lookback(&self) -> usize {
        self.rsi_period
            .max(self.stoch_period)
            .max(self.k_period)
            .max(self.d_period)
    }

    pub fn params(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("rsi_period", self.rsi_period as f64),
            ("stoch_period", self.stoch_period as f64),
            ("k_period", self.k_period as f64),
            ("d_period", self.d_period as f64),
        ]
    }

    pub fn generate(&self, series: &PriceSeries) -> SignalFrame {
        let s = stochastic_rsi(
            &series.closes(),
            self.rsi_period,
            self.stoch_period,
            self.k_period,
            self.d_period,
        );

        SignalFrame::new(long_while_above(&s.k, &s.d))
            .with_column("stoch_k", s.k)
            .with_column("stoch_d", s.d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Signal;

    #[test]
    fn test_flat_market_is_flat() {
        let series = PriceSeries::from_closes(&[100.0; 80]).unwrap();
        let frame = StochasticRsiParams::default().generate(&series);
        assert!(frame.signals.iter().all(|s| *s == Signal::Flat));
    }

    #[test]
    fn test_oscillating_market_trades_both_ways() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 8.0)
            .collect();
        let series = PriceSeries::from_closes(&closes).unwrap();
        let frame = StochasticRsiParams::default().generate(&series);
        assert!(frame.signals.contains(&Signal::Long));
        assert!(frame.signals[40..].contains(&Signal::Flat));
    }
}
