//! ADX trend strength: long when the trend is both strong and bullish

use serde::{Deserialize, Serialize};

use super::{check_period, SignalFrame};
use crate::error::ParamError;
use crate::indicators::dmi;
use crate::{PriceSeries, Signal};

pub const NAME: &str = "ADX Trend";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdxTrendParams {
    pub period: usize,
    pub adx_threshold: f64,
}

impl Default for AdxTrendParams {
    fn default() -> Self {
        Self {
            period: 14,
            adx_threshold: 25.0,
        }
    }
}

impl AdxTrendParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        check_period(NAME, "period", self.period)?;
        if !(0.0..=100.0).contains(&self.adx_threshold) {
            return Err(ParamError::OutOfRange {
                strategy: NAME,
                name: "adx_threshold",
                value: self.adx_threshold,
                min: 0.0,
                max: 100.0,
            });
        }
        Ok(())
    }

    pub fn lookback(&self) -> usize {
        self.period
    }

    pub fn params(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("period", self.period as f64),
            ("adx_threshold", self.adx_threshold),
        ]
    }

    pub fn generate(&self, series: &PriceSeries) -> SignalFrame {
        let d = dmi(
            &series.highs(),
            &series.lows(),
            &series.closes(),
            self.period,
        );

        let signals = (0..series.len())
            .map(|i| match (d.adx[i], d.plus_di[i], d.minus_di[i]) {
                (Some(adx), Some(plus), Some(minus)) => {
                    Signal::from(adx > self.adx_threshold && plus > minus)
                }
                _ => Signal::Flat,
            })
            .collect();

        SignalFrame::new(signals)
            .with_column("adx", d.adx)
            .with_column("plus_di", d.plus_di)
            .with_column("minus_di", d.minus_di)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Candle;
    use chrono::{Duration, NaiveDate};

    fn trending(step: f64) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let bars = (0..80)
            .map(|i| {
                let c = 200.0 + step * i as f64;
                Candle::new(start + Duration::days(i), c, c + 1.0, c - 1.0, c, 10.0).unwrap()
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    #[test]
    fn test_strong_uptrend_is_long() {
        let frame = AdxTrendParams::default().generate(&trending(1.0));
        assert_eq!(frame.last_signal(), Signal::Long);
    }

    #[test]
    fn test_strong_downtrend_stays_out() {
        let frame = AdxTrendParams::default().generate(&trending(-1.0));
        assert!(frame.signals.iter().all(|s| *s == Signal::Flat));
    }

    #[test]
    fn test_threshold_range_checked() {
        let params = AdxTrendParams {
            adx_threshold: 150.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }
}
