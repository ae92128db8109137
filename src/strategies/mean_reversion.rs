//! RSI mean reversion
//!
//! Buys weakness and sells strength with hysteresis: enter when RSI drops
//! below `low`, stay in until RSI rises above `high`.

use serde::{Deserialize, Serialize};

use super::{check_period, hysteresis, SignalFrame};
use crate::error::ParamError;
use crate::indicators::rsi;
use crate::PriceSeries;

pub const NAME: &str = "RSI Mean Reversion";

fn default_rsi_period() -> usize {
    14
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanReversionParams {
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
    pub low: f64,
    pub high: f64,
}

impl Default for MeanReversionParams {
    fn default() -> Self {
        Self {
            rsi_period: default_rsi_period(),
            low: 30.0,
            high: 70.0,
        }
    }
}

impl MeanReversionParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        check_period(NAME, "rsi_period", self.rsi_period)?;
        for (name, value) in [("low", self.low), ("high", self.high)] {
            if !(value > 0.0 && value < 100.0) {
                return Err(ParamError::OutOfRange {
                    strategy: NAME,
                    name,
                    value,
                    min: 0.0,
                    max: 100.0,
                });
            }
        }
        if self.low >= self.high {
            return Err(ParamError::ThresholdOrder {
                strategy: NAME,
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }

    pub fn lookback(&self) -> usize {
        self.rsi_period
    }

    pub fn params(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("rsi_period", self.rsi_period as f64),
            ("low", self.low),
            ("high", self.high),
        ]
    }

    pub fn generate(&self, series: &PriceSeries) -> SignalFrame {
        let rsi_values = rsi(&series.closes(), self.rsi_period);

        // an undefined RSI neither enters nor exits
        let signals = hysteresis(rsi_values.iter().map(|r| match r {
            Some(r) => (*r < self.low, *r > self.high),
            None => (false, false),
        }));

        SignalFrame::new(signals).with_column("rsi", rsi_values)
    }
}
