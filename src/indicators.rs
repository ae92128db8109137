//! Technical indicators
//!
//! Pure transforms over price projections. Every function returns one value
//! per input bar; `None` marks the prefix where the lookback is not yet
//! satisfied (or where the indicator is mathematically undefined), and
//! callers never trade on it.

use statrs::statistics::Statistics;

/// Simple Moving Average
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = Vec::with_capacity(values.len());

    for i in 0..values.len() {
        if period == 0 || i + 1 < period {
            result.push(None);
        } else {
            let sum: f64 = values[i + 1 - period..=i].iter().sum();
            result.push(Some(sum / period as f64));
        }
    }

    result
}

/// Simple Moving Average over a partially defined series.
///
/// A value is produced only when the whole window is defined.
pub fn sma_defined(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let sum: Option<f64> = window.iter().copied().sum();
            sum.map(|s| s / period as f64)
        })
        .collect()
}

/// Exponential Moving Average, α = 2 / (span + 1), seeded by the first value
pub fn ema(values: &[f64], span: usize) -> Vec<Option<f64>> {
    let defined: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    ema_defined(&defined, span)
}

/// Exponentially weighted mean with smoothing constant `alpha`.
///
/// Seeded by the first defined value; undefined inputs yield `None` without
/// resetting the running state.
pub fn ewm(values: &[Option<f64>], alpha: f64) -> Vec<Option<f64>> {
    let mut state: Option<f64> = None;
    values
        .iter()
        .map(|v| {
            let x = (*v)?;
            let next = match state {
                None => x,
                // exact on constant input
                Some(prev) => prev + alpha * (x - prev),
            };
            state = Some(next);
            Some(next)
        })
        .collect()
}

/// Exponentially weighted mean with bias-corrected weights: each output is
/// the `(1 - alpha)^k`-weighted average of every defined value so far.
///
/// Undefined inputs yield `None` and are skipped.
pub fn ewm_adjusted(values: &[Option<f64>], alpha: f64) -> Vec<Option<f64>> {
    let decay = 1.0 - alpha;
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    values
        .iter()
        .map(|v| {
            let x = (*v)?;
            numerator = x + decay * numerator;
            denominator = 1.0 + decay * denominator;
            Some(numerator / denominator)
        })
        .collect()
}

/// EMA over a partially defined series (span convention, α = 2 / (span + 1))
pub fn ema_defined(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    if span == 0 {
        return vec![None; values.len()];
    }
    ewm(values, 2.0 / (span as f64 + 1.0))
}

/// Wilder smoothing, α = 1 / period
pub fn wilder(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    ewm(values, 1.0 / period as f64)
}

/// Rolling sample standard deviation (n - 1 denominator)
pub fn rolling_std(values: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if period < 2 || i + 1 < period {
                return None;
            }
            let sd = values[i + 1 - period..=i].iter().std_dev();
            sd.is_finite().then_some(sd)
        })
        .collect()
}

/// Calculate True Range; the first bar has no previous close and uses `high - low`
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(high.len());

    for i in 0..high.len() {
        let tr_value = if i == 0 {
            high[i] - low[i]
        } else {
            let hl = high[i] - low[i];
            let hc = (high[i] - close[i - 1]).abs();
            let lc = (low[i] - close[i - 1]).abs();
            hl.max(hc).max(lc)
        };
        tr.push(tr_value);
    }

    tr
}

/// Average True Range: rolling mean of the True Range
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<Option<f64>> {
    sma(&true_range(high, low, close), period)
}

/// Three aligned price bands
#[derive(Debug, Clone)]
pub struct Bands {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Bollinger Bands: SMA(period) ± num_std · sample stddev(period)
pub fn bollinger_bands(values: &[f64], period: usize, num_std: f64) -> Bands {
    let middle = sma(values, period);
    let std = rolling_std(values, period);

    let (upper, lower) = middle
        .iter()
        .zip(&std)
        .map(|(mid, sd)| match (mid, sd) {
            (Some(m), Some(s)) => (Some(m + num_std * s), Some(m - num_std * s)),
            _ => (None, None),
        })
        .unzip();

    Bands {
        upper,
        middle,
        lower,
    }
}

/// Keltner channel: SMA(close, period) ± multiplier · ATR(period)
pub fn keltner_channel(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period: usize,
    multiplier: f64,
) -> Bands {
    let middle = sma(close, period);
    let atr_values = atr(high, low, close, period);

    let (upper, lower) = middle
        .iter()
        .zip(&atr_values)
        .map(|(mid, a)| match (mid, a) {
            (Some(m), Some(a)) => (Some(m + multiplier * a), Some(m - multiplier * a)),
            _ => (None, None),
        })
        .unzip();

    Bands {
        upper,
        middle,
        lower,
    }
}

/// Calculate RSI (Relative Strength Index) with Wilder smoothing.
///
/// The first `period` bars are undefined. A window without any down-move
/// (average loss of zero) reads 100.
pub fn rsi(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    if period == 0 || n == 0 {
        return vec![None; n];
    }

    let mut gains = Vec::with_capacity(n);
    let mut losses = Vec::with_capacity(n);
    gains.push(None);
    losses.push(None);

    for i in 1..n {
        let change = values[i] - values[i - 1];
        gains.push(Some(change.max(0.0)));
        losses.push(Some((-change).max(0.0)));
    }

    let avg_gains = wilder(&gains, period);
    let avg_losses = wilder(&losses, period);

    (0..n)
        .map(|i| {
            if i < period {
                return None;
            }
            let (avg_gain, avg_loss) = (avg_gains[i]?, avg_losses[i]?);
            if avg_loss == 0.0 {
                Some(100.0)
            } else {
                let rs = avg_gain / avg_loss;
                Some(100.0 - 100.0 / (1.0 + rs))
            }
        })
        .collect()
}

/// MACD line, signal line and histogram
#[derive(Debug, Clone)]
pub struct Macd {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// MACD: EMA(fast) - EMA(slow), signal = EMA(signal) of the MACD line
pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    let fast_ema = ema(values, fast);
    let slow_ema = ema(values, slow);

    let line: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let signal = ema_defined(&line, signal);
    let histogram = line
        .iter()
        .zip(&signal)
        .map(|(l, s)| Some((*l)? - (*s)?))
        .collect();

    Macd {
        line,
        signal,
        histogram,
    }
}

/// Stochastic RSI %K and %D
#[derive(Debug, Clone)]
pub struct StochRsi {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

/// Stochastic RSI: RSI normalized to [0, 100] over `stoch_period`,
/// %K = SMA(k_period), %D = SMA(d_period) of %K.
///
/// Windows where RSI did not move (zero range) are undefined.
pub fn stochastic_rsi(
    values: &[f64],
    rsi_period: usize,
    stoch_period: usize,
    k_period: usize,
    d_period: usize,
) -> StochRsi {
    let rsi_values = rsi(values, rsi_period);

    let stoch: Vec<Option<f64>> = (0..rsi_values.len())
        .map(|i| {
            if stoch_period == 0 || i + 1 < stoch_period {
                return None;
            }
            let window: Option<Vec<f64>> = rsi_values[i + 1 - stoch_period..=i]
                .iter()
                .copied()
                .collect();
            let window = window?;
            let lowest = window.iter().copied().fold(f64::INFINITY, f64::min);
            let highest = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let range = highest - lowest;
            if range <= 0.0 {
                return None;
            }
            Some(100.0 * (rsi_values[i]? - lowest) / range)
        })
        .collect();

    let k = sma_defined(&stoch, k_period);
    let d = sma_defined(&k, d_period);
    StochRsi { k, d }
}

/// Awesome Oscillator: SMA(fast) - SMA(slow) of the median price
pub fn awesome_oscillator(median_prices: &[f64], fast: usize, slow: usize) -> Vec<Option<f64>> {
    let fast_sma = sma(median_prices, fast);
    let slow_sma = sma(median_prices, slow);
    fast_sma
        .iter()
        .zip(&slow_sma)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect()
}

/// Directional movement: +DI, -DI and ADX
#[derive(Debug, Clone)]
pub struct Dmi {
    pub plus_di: Vec<Option<f64>>,
    pub minus_di: Vec<Option<f64>>,
    pub adx: Vec<Option<f64>>,
}

/// Calculate +DI/-DI and ADX.
///
/// +DM is the rise in the high and -DM the fall in the low, each floored at
/// zero and counted independently, so an outside bar feeds both sides. DM and
/// DX are smoothed with the bias-corrected `ewm_adjusted` at α = 1 / period;
/// the DI denominator is the rolling-mean ATR.
pub fn dmi(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Dmi {
    let n = high.len();
    if period == 0 {
        return Dmi {
            plus_di: vec![None; n],
            minus_di: vec![None; n],
            adx: vec![None; n],
        };
    }
    let alpha = 1.0 / period as f64;

    let mut plus_dm = vec![None; n];
    let mut minus_dm = vec![None; n];
    for i in 1..n {
        plus_dm[i] = Some((high[i] - high[i - 1]).max(0.0));
        minus_dm[i] = Some((low[i - 1] - low[i]).max(0.0));
    }

    let smoothed_plus = ewm_adjusted(&plus_dm, alpha);
    let smoothed_minus = ewm_adjusted(&minus_dm, alpha);
    let atr_values = atr(high, low, close, period);

    let mut plus_di = Vec::with_capacity(n);
    let mut minus_di = Vec::with_capacity(n);
    let mut dx = Vec::with_capacity(n);

    for i in 0..n {
        match (smoothed_plus[i], smoothed_minus[i], atr_values[i]) {
            (Some(p), Some(m), Some(a)) if a > 0.0 => {
                let pdi = 100.0 * p / a;
                let mdi = 100.0 * m / a;
                let sum = pdi + mdi;
                plus_di.push(Some(pdi));
                minus_di.push(Some(mdi));
                dx.push(Some(if sum > 0.0 {
                    100.0 * (pdi - mdi).abs() / sum
                } else {
                    0.0
                }));
            }
            (Some(_), Some(_), Some(_)) => {
                // zero volatility: no directional information
                plus_di.push(Some(0.0));
                minus_di.push(Some(0.0));
                dx.push(Some(0.0));
            }
            _ => {
                plus_di.push(None);
                minus_di.push(None);
                dx.push(None);
            }
        }
    }

    let adx = ewm_adjusted(&dx, alpha);
    Dmi {
        plus_di,
        minus_di,
        adx,
    }
}

/// SuperTrend stop-and-reverse line and trend direction
#[derive(Debug, Clone)]
pub struct SuperTrend {
    /// Active band: lower band while trending up, upper band while trending down
    pub line: Vec<Option<f64>>,
    /// +1 trending up, -1 trending down (also before the bands exist)
    pub trend: Vec<i8>,
}

/// SuperTrend on ATR bands around the median price.
///
/// A genuine recurrence: each final band depends on the previous final band
/// and the previous close. The lower band only rises (and the upper band only
/// falls) until price closes through it, at which point the trend flips.
pub fn supertrend(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period: usize,
    multiplier: f64,
) -> SuperTrend {
    let n = close.len();
    let atr_values = atr(high, low, close, period);

    let mut line = vec![None; n];
    let mut trend = vec![-1i8; n];
    let mut bands: Option<(f64, f64)> = None;
    let mut trending_up = false;

    for i in 0..n {
        let Some(a) = atr_values[i] else {
            continue;
        };
        let hl2 = (high[i] + low[i]) / 2.0;
        let basic_upper = hl2 + multiplier * a;
        let basic_lower = hl2 - multiplier * a;

        let (final_upper, final_lower) = match bands {
            None => (basic_upper, basic_lower),
            Some((prev_upper, prev_lower)) => {
                let prev_close = close[i - 1];
                let upper = if basic_upper < prev_upper || prev_close > prev_upper {
                    basic_upper
                } else {
                    prev_upper
                };
                let lower = if basic_lower > prev_lower || prev_close < prev_lower {
                    basic_lower
                } else {
                    prev_lower
                };
                (upper, lower)
            }
        };
        bands = Some((final_upper, final_lower));

        trending_up = if trending_up {
            close[i] >= final_lower
        } else {
            close[i] > final_upper
        };

        trend[i] = if trending_up { 1 } else { -1 };
        line[i] = Some(if trending_up { final_lower } else { final_upper });
    }

    SuperTrend { line, trend }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sma() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&values, 3);

        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_eq!(result[2], Some(2.0));
        assert_eq!(result[3], Some(3.0));
        assert_eq!(result[4], Some(4.0));
    }

    #[test]
    fn test_sma_longer_than_series_is_undefined() {
        assert!(sma(&[1.0, 2.0], 5).iter().all(Option::is_none));
    }

    #[test]
    fn test_ema_seeded_by_first_value() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = ema(&values, 3);

        // alpha = 0.5
        assert_eq!(result[0], Some(1.0));
        assert_relative_eq!(result[1].unwrap(), 1.5);
        assert_relative_eq!(result[2].unwrap(), 2.25);
    }

    #[test]
    fn test_rsi_all_gains_reads_100() {
        let values: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let result = rsi(&values, 14);
        assert!(result[..14].iter().all(Option::is_none));
        assert_eq!(result[20], Some(100.0));
    }

    #[test]
    fn test_rsi_all_losses_reads_0() {
        let values: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let result = rsi(&values, 14);
        assert_relative_eq!(result[20].unwrap(), 0.0);
    }

    #[test]
    fn test_rsi_flat_market_is_defined() {
        let values = vec![100.0; 40];
        let result = rsi(&values, 14);
        assert!(result[14..].iter().all(|v| *v == Some(100.0)));
    }

    #[test]
    fn test_true_range_first_bar_uses_high_low() {
        let tr = true_range(&[12.0, 15.0], &[10.0, 13.0], &[11.0, 14.0]);
        assert_eq!(tr[0], 2.0);
        // gap above previous close: |15 - 11| = 4
        assert_eq!(tr[1], 4.0);
    }

    #[test]
    fn test_bollinger_collapse_on_constant_prices() {
        let bands = bollinger_bands(&[100.0; 30], 20, 2.0);
        assert_eq!(bands.upper[25], Some(100.0));
        assert_eq!(bands.middle[25], Some(100.0));
        assert_eq!(bands.lower[25], Some(100.0));
        assert_eq!(bands.upper[18], None);
    }

    #[test]
    fn test_rolling_std_is_sample() {
        let sd = rolling_std(&[1.0, 2.0, 3.0, 4.0], 4);
        // sample variance of 1..4 = 5/3
        assert_relative_eq!(sd[3].unwrap(), (5.0f64 / 3.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_macd_flat_market_is_zero() {
        let m = macd(&[50.0; 40], 12, 26, 9);
        assert_eq!(m.line[39], Some(0.0));
        assert_eq!(m.signal[39], Some(0.0));
    }

    #[test]
    fn test_stochastic_rsi_undefined_without_rsi_range() {
        let s = stochastic_rsi(&[100.0; 60], 9, 9, 3, 3);
        assert!(s.k.iter().all(Option::is_none));
        assert!(s.d.iter().all(Option::is_none));
    }

    #[test]
    fn test_stochastic_rsi_bounded() {
        let values: Vec<f64> = (0..80)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0)
            .collect();
        let s = stochastic_rsi(&values, 9, 9, 3, 3);
        for v in s.k.iter().flatten() {
            assert!((0.0..=100.0).contains(v));
        }
        assert!(s.d.iter().any(Option::is_some));
    }

    #[test]
    fn test_adx_strong_uptrend() {
        let n = 80;
        let high: Vec<f64> = (0..n).map(|i| 101.0 + i as f64).collect();
        let low: Vec<f64> = (0..n).map(|i| 99.0 + i as f64).collect();
        let close: Vec<f64> = (0..n).map(|i| 100.5 + i as f64).collect();
        let d = dmi(&high, &low, &close, 14);

        let last = n - 1;
        assert!(d.plus_di[last].unwrap() > d.minus_di[last].unwrap());
        assert!(d.adx[last].unwrap() > 25.0);
    }

    #[test]
    fn test_outside_bars_count_both_directions() {
        // every bar engulfs the previous one: highs rise 2, lows fall 1
        let n = 60;
        let high: Vec<f64> = (0..n).map(|i| 110.0 + 2.0 * i as f64).collect();
        let low: Vec<f64> = (0..n).map(|i| 90.0 - i as f64).collect();
        let close: Vec<f64> = high.iter().zip(&low).map(|(h, l)| (h + l) / 2.0).collect();
        let d = dmi(&high, &low, &close, 14);

        let last = n - 1;
        let (plus, minus) = (d.plus_di[last].unwrap(), d.minus_di[last].unwrap());
        assert!(minus > 0.0);
        assert!(plus > minus);
        assert_relative_eq!(plus / minus, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ewm_adjusted_weights() {
        let out = ewm_adjusted(&[None, Some(1.0), Some(3.0)], 0.5);
        assert_eq!(out[0], None);
        assert_relative_eq!(out[1].unwrap(), 1.0);
        // (3 + 0.5 * 1) / (1 + 0.5)
        assert_relative_eq!(out[2].unwrap(), 3.5 / 1.5);
    }

    #[test]
    fn test_supertrend_flips_up_and_ratchets() {
        // flat, then a strong rally
        let mut close: Vec<f64> = vec![100.0; 15];
        close.extend((1..=20).map(|i| 100.0 + 3.0 * i as f64));
        let high: Vec<f64> = close.iter().map(|c| c + 1.0).collect();
        let low: Vec<f64> = close.iter().map(|c| c - 1.0).collect();

        let st = supertrend(&high, &low, &close, 5, 2.0);
        assert_eq!(st.trend[10], -1);
        assert_eq!(*st.trend.last().unwrap(), 1);

        // while up, the support line never loosens
        let up_lines: Vec<f64> = st
            .trend
            .iter()
            .zip(&st.line)
            .skip_while(|(t, _)| **t != 1)
            .filter_map(|(_, l)| *l)
            .collect();
        assert!(up_lines.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_supertrend_flat_market_stays_down() {
        let close = vec![100.0; 30];
        let st = supertrend(&close, &close, &close, 10, 3.0);
        assert!(st.trend.iter().all(|t| *t == -1));
    }

    #[test]
    fn test_awesome_oscillator_sign() {
        let median: Vec<f64> = (0..40).map(|i| 10.0 + i as f64).collect();
        let ao = awesome_oscillator(&median, 5, 34);
        assert!(ao[32].is_none());
        assert!(ao[39].unwrap() > 0.0);
    }
}
