//! EMA crossover: long while the fast EMA is above the slow EMA

use serde::{Deserialize, Serialize};

use super::{check_fast_slow, long_while_above, SignalFrame};
use crate::error::ParamError;
use crate::indicators::ema;
use crate::PriceSeries;

pub const NAME: &str = "EMA Crossover";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmaCrossoverParams {
    pub fast: usize,
    pub slow: usize,
}

impl Default for EmaCrossoverParams {
    fn default() -> Self {
        Self { fast: 9, slow: 21 }
    }
}

impl EmaCrossoverParams {
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
        let close = series.closes();
        let fast = ema(&close, self.fast);
        let slow = ema(&close, self.slow);

        SignalFrame::new(long_while_above(&fast, &slow))
            .with_column("ema_fast", fast)
            .with_column("ema_slow", slow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Signal;

    #[test]
    fn test_follows_trend_direction() {
        let mut closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        closes.extend((0..30).map(|i| 129.0 - 2.0 * i as f64));
        let series = PriceSeries::from_closes(&closes).unwrap();
        let frame = EmaCrossoverParams::default().generate(&series);

        assert_eq!(frame.signals[29], Signal::Long);
        assert_eq!(frame.last_signal(), Signal::Flat);
    }
}
