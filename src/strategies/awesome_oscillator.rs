//! Awesome Oscillator: long while the median-price SMA spread is positive

use serde::{Deserialize, Serialize};

use super::{check_fast_slow, SignalFrame};
use crate::error::ParamError;
use crate::indicators::awesome_oscillator;
use crate::{PriceSeries, Signal};

pub const NAME: &str = "Awesome Oscillator";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AwesomeOscillatorParams {
    pub fast: usize,
    pub slow: usize,
}

impl Default for AwesomeOscillatorParams {
    fn default() -> Self {
        Self { fast: 5, slow: 34 }
    }
}

impl AwesomeOscillatorParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        check_fast_slow(NAME, self.fast, self.slow)
    }

    pub fn lookback(&self) -> usize {
        self.fast.max(self.slow)
    }

    pub fn params(&self) -> Vec<(&'static str, f64)> {
        vec![("fast", self.fast as f64), ("slow", self.slow as f64)]
    }

    pub fn generate(&self, series: &PriceSeries) -> SignalFrame {
        let ao = awesome_oscillator(&series.median_prices(), self.fast, self.slow);
        let signals = ao
            .iter()
            .map(|v| Signal::from(v.is_some_and(|v| v > 0.0)))
            .collect();

        SignalFrame::new(signals).with_column("ao", ao)
    }
}
