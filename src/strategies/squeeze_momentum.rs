//! Squeeze momentum
//!
//! Momentum is the EMA of the close's distance from the median-price SMA;
//! the strategy is long while momentum is positive. The squeeze state
//! (Bollinger bands inside the Keltner channel) is reported as a column but
//! does not gate the signal.

use serde::{Deserialize, Serialize};

use super::{check_period, check_positive, SignalFrame};
use crate::error::ParamError;
use crate::indicators::{atr, ema_defined, rolling_std, sma};
use crate::{PriceSeries, Signal};

pub const NAME: &str = "Squeeze Momentum";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SqueezeMomentumParams {
    pub bb_len: usize,
    pub bb_mult: f64,
    pub kc_len: usize,
    pub kc_mult: f64,
}

impl Default for SqueezeMomentumParams {
    fn default() -> Self {
        Self {
            bb_len: 20,
            bb_mult: 2.0,
            kc_len: 20,
            kc_mult: 1.5,
        }
    }
}

impl SqueezeMomentumParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        check_period(NAME, "bb_len", self.bb_len)?;
        check_period(NAME, "kc_len", self.kc_len)?;
        check_positive(NAME, "bb_mult", self.bb_mult)?;
        check_positive(NAME, "kc_mult", self.kc_mult)
    }

    pub fn lookback(&self) -> usize {
        self.bb_len.max(self.kc_len)
    }

    pub fn params(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("bb_len", self.bb_len as f64),
            ("bb_mult", self.bb_mult),
            ("kc_len", self.kc_len as f64),
            ("kc_mult", self.kc_mult),
        ]
    }

    pub fn generate(&self, series: &PriceSeries) -> SignalFrame {
        let close = series.closes();
        let high = series.highs();
        let low = series.lows();

        let median_sma = sma(&series.median_prices(), self.bb_len);
        let distance: Vec<Option<f64>> = close
            .iter()
            .zip(&median_sma)
            .map(|(c, m)| m.map(|m| c - m))
            .collect();
        let momentum = ema_defined(&distance, self.bb_len);

        // both envelopes share the Bollinger basis
        let basis = sma(&close, self.bb_len);
        let std = rolling_std(&close, self.bb_len);
        let range = atr(&high, &low, &close, self.kc_len);
        let squeeze_on: Vec<Option<f64>> = (0..close.len())
            .map(|i| {
                let (mid, sd, a) = (basis[i]?, std[i]?, range[i]?);
                let inside = mid + self.bb_mult * sd < mid + self.kc_mult * a
                    && mid - self.bb_mult * sd > mid - self.kc_mult * a;
                Some(if inside { 1.0 } else { 0.0 })
            })
            .collect();

        let signals = momentum
            .iter()
            .map(|m| Signal::from(m.is_some_and(|m| m > 0.0)))
            .collect();

        SignalFrame::new(signals)
            .with_column("momentum", momentum)
            .with_column("squeeze_on", squeeze_on)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rising_market_has_positive_momentum() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let series = PriceSeries::from_closes(&closes).unwrap();
        let frame = SqueezeMomentumParams::default().generate(&series);

        assert_eq!(frame.signals[18], Signal::Flat);
        assert!(frame.signals[20..].iter().all(|s| *s == Signal::Long));
    }

    #[test]
    fn test_squeeze_column_does_not_gate_signal() {
        let series = PriceSeries::from_closes(&[100.0; 40]).unwrap();
        let frame = SqueezeMomentumParams::default().generate(&series);
        assert!(frame.signals.iter().all(|s| *s == Signal::Flat));
        // zero width bands: neither strictly inside the other
        assert_eq!(frame.column("squeeze_on").unwrap()[30], Some(0.0));
    }
}
