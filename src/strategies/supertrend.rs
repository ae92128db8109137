//! SuperTrend
//!
//! ATR bands around the median price act as a stop-and-reverse line. The
//! active band ratchets toward price and only resets when price closes
//! through it.

use serde::{Deserialize, Serialize};

use super::{check_period, check_positive, SignalFrame};
use crate::error::ParamError;
use crate::indicators::supertrend;
use crate::{PriceSeries, Signal};

pub const NAME: &str = "SuperTrend";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuperTrendParams {
    pub period: usize,
    pub multiplier: f64,
}

impl Default for SuperTrendParams {
    fn default() -> Self {
        Self {
            period: 10,
            multiplier: 3.0,
        }
    }
}

impl SuperTrendParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        check_period(NAME, "period", self.period)?;
        check_positive(NAME, "multiplier", self.multiplier)
    }

    pub fn lookback(&self) -> usize {
        self.period
    }

    pub fn params(&self) -> Vec<(&'static str, f64)> {
        vec![("period", self.period as f64), ("multiplier", self.multiplier)]
    }

    pub fn generate(&self, series: &PriceSeries) -> SignalFrame {
        let st = supertrend(
            &series.highs(),
            &series.lows(),
            &series.closes(),
            self.period,
            self.multiplier,
        );
        let signals = st.trend.iter().map(|t| Signal::from(*t == 1)).collect();

        SignalFrame::new(signals)
            .with_column("supertrend", st.line)
            .with_trend(st.trend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Candle;
    use chrono::{Duration, NaiveDate};

    fn ranged_series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Candle::new(start + Duration::days(i as i64), c, c + 1.0, c - 1.0, c, 1_000.0)
                    .unwrap()
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    #[test]
    fn test_signal_tracks_trend_column() {
        let mut closes: Vec<f64> = (0..30).map(|i| 100.0 + 2.0 * i as f64).collect();
        closes.extend((0..30).map(|i| 158.0 - 3.0 * i as f64));
        let frame = SuperTrendParams::default().generate(&ranged_series(&closes));

        let trend = frame.trend.as_ref().unwrap();
        for (signal, t) in frame.signals.iter().zip(trend) {
            assert_eq!(signal.is_long(), *t == 1);
        }
        assert!(frame.signals[..30].contains(&Signal::Long));
        assert_eq!(frame.last_signal(), Signal::Flat);
    }
}
