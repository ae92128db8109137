//! Bollinger breakout
//!
//! Enters when the close pushes above the upper band and rides the move
//! until the close falls back under the middle band.

use serde::{Deserialize, Serialize};

use super::{check_period, check_positive, hysteresis, SignalFrame};
use crate::error::ParamError;
use crate::indicators::bollinger_bands;
use crate::PriceSeries;

pub const NAME: &str = "Bollinger Breakout";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBreakoutParams {
    pub window: usize,
    pub std_dev: f64,
}

impl Default for BollingerBreakoutParams {
    fn default() -> Self {
        Self {
            window: 20,
            std_dev: 2.0,
        }
    }
}

impl BollingerBreakoutParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        check_period(NAME, "window", self.window)?;
        check_positive(NAME, "std_dev", self.std_dev)
    }

    pub fn lookback(&self) -> usize {
        self.window
    }

    pub fn params(&self) -> Vec<(&'static str, f64)> {
        vec![("window", self.window as f64), ("std_dev", self.std_dev)]
    }

    pub fn generate(&self, series: &PriceSeries) -> SignalFrame {
        let close = series.closes();
        let bands = bollinger_bands(&close, self.window, self.std_dev);

        let conditions = close.iter().enumerate().map(|(i, &c)| {
            let enter = bands.upper[i].is_some_and(|upper| c > upper);
            let exit = bands.middle[i].is_some_and(|middle| c < middle);
            (enter, exit)
        });
        let signals = hysteresis(conditions);

        SignalFrame::new(signals)
            .with_column("bb_upper", bands.upper)
            .with_column("bb_middle", bands.middle)
            .with_column("bb_lower", bands.lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Signal;

    #[test]
    fn test_breakout_held_until_middle_band_lost() {
        let mut closes = vec![100.0, 101.0, 100.0, 99.0, 100.0, 101.0, 100.0, 99.0];
        // breakout, consolidation above the middle, then a breakdown
        closes.extend([106.0, 104.0, 103.0, 102.5, 95.0]);
        let series = PriceSeries::from_closes(&closes).unwrap();
        let params = BollingerBreakoutParams {
            window: 5,
            std_dev: 1.0,
        };
        let frame = params.generate(&series);
        let upper = frame.column("bb_upper").unwrap();
        let middle = frame.column("bb_middle").unwrap();

        assert!(closes[8] > upper[8].unwrap());
        assert_eq!(frame.signals[8], Signal::Long);
        // no longer above the upper band, but still above the middle
        assert!(closes[10] <= upper[10].unwrap());
        assert!(closes[10] >= middle[10].unwrap());
        assert_eq!(frame.signals[10], Signal::Long);
        assert_eq!(frame.signals[12], Signal::Flat);
    }

    #[test]
    fn test_flat_market_no_breakout() {
        let series = PriceSeries::from_closes(&[100.0; 50]).unwrap();
        let frame = BollingerBreakoutParams::default().generate(&series);
        assert!(frame.signals.iter().all(|s| *s == Signal::Flat));
        assert_eq!(frame.column("bb_upper").unwrap()[30], Some(100.0));
    }
}
