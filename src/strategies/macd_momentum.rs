//! MACD momentum: long while the MACD line is above its signal line

use serde::{Deserialize, Serialize};

use super::{check_fast_slow, check_period, long_while_above, SignalFrame};
use crate::error::ParamError;
use crate::indicators::macd;
use crate::PriceSeries;

pub const NAME: &str = "MACD Momentum";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdMomentumParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdMomentumParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

impl MacdMomentumParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        check_fast_slow(NAME, self.fast, self.slow)?;
        check_period(NAME, "signal", self.signal)
    }

    pub fn lookback(&self) -> usize {
        self.fast.max(self.slow).max(self.signal)
    }

    pub fn params(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("fast", self.fast as f64),
            ("slow", self.slow as f64),
            ("signal", self.signal as f64),
        ]
    }

    pub fn generate(&self, series: &PriceSeries) -> SignalFrame {
        let m = macd(&series.closes(), self.fast, self.slow, self.signal);

        SignalFrame::new(long_while_above(&m.line, &m.signal))
            .with_column("macd", m.line)
            .with_column("macd_signal", m.signal)
            .with_column("macd_hist", m.histogram)
    }
}
