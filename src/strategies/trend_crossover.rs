//! Golden Cross
//!
//! Long while the fast simple moving average sits above the slow one.

use serde::{Deserialize, Serialize};

use super::{check_fast_slow, long_while_above, SignalFrame};
use crate::error::ParamError;
use crate::indicators::sma;
use crate::PriceSeries;

pub const NAME: &str = "Golden Cross";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendCrossoverParams {
    pub fast: usize,
    pub slow: usize,
}

impl Default for TrendCrossoverParams {
    fn default() -> Self {
        Self { fast: 50, slow: 200 }
    }
}

impl TrendCrossoverParams {
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
        let fast = sma(&close, self.fast);
        let slow = sma(&close, self.slow);

        SignalFrame::new(long_while_above(&fast, &slow))
            .with_column("sma_fast", fast)
            .with_column("sma_slow", slow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Signal;

    #[test]
    fn test_exit_on_the_bar_fast_drops_below() {
        let series = PriceSeries::from_closes(&[10.0, 11.0, 12.0, 13.0, 14.0, 9.0, 8.0]).unwrap();
        let params = TrendCrossoverParams { fast: 2, slow: 3 };
        let frame = params.generate(&series);

        // SMA(3) is undefined before index 2
        assert_eq!(frame.signals[1], Signal::Flat);
        assert!(frame.signals[2..5].iter().all(|s| *s == Signal::Long));
        // fast = 11.5 < slow = 12.0 first holds at index 5
        assert_eq!(frame.signals[5], Signal::Flat);
        assert_eq!(frame.signals[6], Signal::Flat);
    }

    #[test]
    fn test_validate_rejects_fast_not_below_slow() {
        let err = TrendCrossoverParams { fast: 200, slow: 50 }
            .validate()
            .unwrap_err();
        assert!(matches!(err, ParamError::FastNotBelowSlow { .. }));
    }
}
