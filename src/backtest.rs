//! Vectorized backtesting kernel
//!
//! Turns a price series and a signal series into performance metrics. The
//! position held over bar `t` is the signal of bar `t - 1`: a strategy only
//! earns today's move if it was positioned yesterday.
//!
//! Every Flat to Long transition opens a [`Trade`] and the next Long to Flat
//! transition closes it, on the same lag: the trade earns the bars after its
//! entry signal up to and including its exit bar.

use chrono::NaiveDate;
use serde::Serialize;
use statrs::statistics::Statistics;

use crate::strategies::StrategySpec;
use crate::{PriceSeries, Signal};

/// Series shorter than this are not evaluated
pub const MIN_BARS: usize = 20;

/// Annualization factor for daily bars
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// One round trip from an entry signal to the matching exit signal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    /// Exit bar, or the last bar while the position is still open
    pub exit_index: usize,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    /// Compounded strategy return over the bars held
    pub trade_return: f64,
    pub open: bool,
}

impl Trade {
    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }

    pub fn is_win(&self) -> bool {
        self.trade_return > 0.0
    }
}

/// Metrics for one (series, signal) evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    /// Fractional return over the whole series (0.25 = +25%)
    pub total_return: f64,
    pub sharpe_ratio: f64,
    /// Worst peak-to-trough decline, always <= 0
    pub max_drawdown: f64,
    /// Growth of 1.0, one point per bar
    pub equity_curve: Vec<f64>,
    /// Buy-and-hold return over the same bars
    pub benchmark_return: f64,
    /// Fraction of bars spent in the market
    pub exposure: f64,
    pub trades: Vec<Trade>,
    pub total_trades: usize,
    /// Fraction of trades with a positive return
    pub win_rate: f64,
    /// Sum of winning returns over the absolute sum of losing returns
    pub profit_factor: f64,
}

impl BacktestResult {
    /// Worst-case result for inputs that cannot be evaluated.
    ///
    /// A total return of negative infinity guarantees the scout never picks it.
    pub fn sentinel() -> Self {
        Self {
            total_return: f64::NEG_INFINITY,
            sharpe_ratio: 0.0,
            max_drawdown: -1.0,
            equity_curve: Vec::new(),
            benchmark_return: 0.0,
            exposure: 0.0,
            trades: Vec::new(),
            total_trades: 0,
            win_rate: 0.0,
            profit_factor: 0.0,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.total_return == f64::NEG_INFINITY && self.equity_curve.is_empty()
    }
}

/// Per-bar market returns; the first bar has none and reads 0
pub fn market_returns(closes: &[f64]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return returns;
    }
    returns.push(0.0);
    returns.extend(closes.windows(2).map(|w| {
        if w[0] > 0.0 {
            (w[1] - w[0]) / w[0]
        } else {
            0.0
        }
    }));
    returns
}

/// Per-bar strategy returns: market return at `t` times the signal at `t - 1`
pub fn strategy_returns(closes: &[f64], signals: &[Signal]) -> Vec<f64> {
    let market = market_returns(closes);
    let mut returns = Vec::with_capacity(market.len());
    if market.is_empty() {
        return returns;
    }
    returns.push(0.0);
    returns.extend(
        market[1..]
            .iter()
            .zip(signals)
            .map(|(r, held)| r * held.exposure()),
    );
    returns
}

/// Equity curve as the cumulative product of `1 + r`, starting at 1.0
pub fn equity_curve(returns: &[f64]) -> Vec<f64> {
    let mut curve = Vec::with_capacity(returns.len());
    let mut equity = 1.0;

    for (i, r) in returns.iter().enumerate() {
        if i > 0 {
            equity *= 1.0 + r;
        }
        curve.push(equity);
    }

    curve
}

/// Minimum of `(equity - running_max) / running_max`
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;

    for &e in equity {
        peak = peak.max(e);
        if peak > 0.0 {
            worst = worst.min((e - peak) / peak);
        }
    }

    worst
}

/// Annualized Sharpe ratio with the sample standard deviation.
///
/// Zero when the deviation is zero or undefined.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = returns.iter().mean();
    let std_dev = returns.iter().std_dev();

    if std_dev.is_finite() && std_dev > 0.0 {
        mean / std_dev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

/// Round trips implied by `signals`, valued with the per-bar `returns` from
/// [`strategy_returns`]. An entry on the last bar has held nothing and is
/// not a trade; a position still open at the end closes on the last bar.
pub fn extract_trades(series: &PriceSeries, signals: &[Signal], returns: &[f64]) -> Vec<Trade> {
    let bars = series.bars();
    let last = bars.len().min(signals.len()).min(returns.len());
    let mut trades = Vec::new();
    let mut entry: Option<usize> = None;

    let close_trade = |entry: usize, exit: usize, open: bool| Trade {
        entry_index: entry,
        entry_date: bars[entry].date,
        entry_price: bars[entry].close,
        exit_index: exit,
        exit_date: bars[exit].date,
        exit_price: bars[exit].close,
        trade_return: returns[entry + 1..=exit]
            .iter()
            .fold(1.0, |acc, r| acc * (1.0 + r))
            - 1.0,
        open,
    };

    for (i, signal) in signals[..last].iter().enumerate() {
        match (entry, signal.is_long()) {
            (None, true) => entry = Some(i),
            (Some(start), false) => {
                trades.push(close_trade(start, i, false));
                entry = None;
            }
            _ => {}
        }
    }
    if let Some(start) = entry {
        if start + 1 < last {
            trades.push(close_trade(start, last - 1, true));
        }
    }

    trades
}

/// Win rate and profit factor of a trade list
pub fn trade_stats(trades: &[Trade]) -> (f64, f64) {
    if trades.is_empty() {
        return (0.0, 0.0);
    }
    let wins = trades.iter().filter(|t| t.is_win()).count();
    let gross_profit: f64 = trades.iter().filter(|t| t.is_win()).map(|t| t.trade_return).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| !t.is_win())
        .map(|t| t.trade_return.abs())
        .sum();

    let profit_factor = if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };
    (wins as f64 / trades.len() as f64, profit_factor)
}

/// Evaluate a signal series against a price series.
///
/// Series shorter than [`MIN_BARS`], or signals not aligned with the bars,
/// yield [`BacktestResult::sentinel`].
pub fn evaluate(series: &PriceSeries, signals: &[Signal]) -> BacktestResult {
    if series.len() < MIN_BARS || signals.len() != series.len() {
        return BacktestResult::sentinel();
    }

    let closes = series.closes();
    let returns = strategy_returns(&closes, signals);
    let curve = equity_curve(&returns);

    // bar 0 has no return
    let realized = &returns[1..];
    let total_return = curve.last().map_or(0.0, |e| e - 1.0);

    let benchmark_return = match (closes.first(), closes.last()) {
        (Some(&first), Some(&last)) if first > 0.0 => last / first - 1.0,
        _ => 0.0,
    };
    let held = signals[..signals.len() - 1]
        .iter()
        .filter(|s| s.is_long())
        .count();
    let trades = extract_trades(series, signals, &returns);
    let (win_rate, profit_factor) = trade_stats(&trades);

    BacktestResult {
        total_return,
        sharpe_ratio: sharpe_ratio(realized),
        max_drawdown: max_drawdown(&curve),
        benchmark_return,
        exposure: held as f64 / realized.len() as f64,
        equity_curve: curve,
        total_trades: trades.len(),
        win_rate,
        profit_factor,
        trades,
    }
}

/// Generate the strategy's signals and evaluate them
pub fn run(series: &PriceSeries, spec: &StrategySpec) -> BacktestResult {
    let frame = spec.generate_signals(series);
    evaluate(series, &frame.signals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_signal_is_lagged_one_bar() {
        let closes = [100.0, 110.0, 121.0];
        // long only on the last bar: nothing earned yet
        let r = strategy_returns(&closes, &[Signal::Flat, Signal::Flat, Signal::Long]);
        assert_eq!(r, vec![0.0, 0.0, 0.0]);

        // long on bar 1 earns bar 2's move
        let r = strategy_returns(&closes, &[Signal::Flat, Signal::Long, Signal::Flat]);
        assert_relative_eq!(r[2], 0.1, epsilon = 1e-12);
        assert_eq!(r[1], 0.0);
    }

    #[test]
    fn test_equity_curve_starts_at_one() {
        let curve = equity_curve(&[0.0, 0.1, -0.5]);
        assert_eq!(curve.len(), 3);
        assert_eq!(curve[0], 1.0);
        assert_relative_eq!(curve[2], 0.55, epsilon = 1e-12);
    }

    #[test]
    fn test_max_drawdown() {
        assert_relative_eq!(max_drawdown(&[1.0, 1.2, 0.9, 1.1]), -0.25, epsilon = 1e-12);
        assert_eq!(max_drawdown(&[1.0, 1.0, 1.5, 2.0]), 0.0);
    }

    #[test]
    fn test_sharpe_zero_without_variance() {
        assert_eq!(sharpe_ratio(&[0.0; 30]), 0.0);
        assert_eq!(sharpe_ratio(&[0.01; 30]), 0.0);
        assert_eq!(sharpe_ratio(&[0.01]), 0.0);
    }

    #[test]
    fn test_short_series_returns_sentinel() {
        let series = PriceSeries::from_closes(&[100.0; 19]).unwrap();
        let result = evaluate(&series, &[Signal::Long; 19]);
        assert!(result.is_sentinel());
        assert_eq!(result.total_return, f64::NEG_INFINITY);
        assert_eq!(result.max_drawdown, -1.0);
    }

    #[test]
    fn test_misaligned_signals_return_sentinel() {
        let series = PriceSeries::from_closes(&[100.0; 30]).unwrap();
        assert!(evaluate(&series, &[Signal::Long; 29]).is_sentinel());
    }

    #[test]
    fn test_always_long_matches_benchmark() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.4).sin() * 5.0).collect();
        let series = PriceSeries::from_closes(&closes).unwrap();
        let result = evaluate(&series, &[Signal::Long; 40]);

        assert_relative_eq!(result.total_return, result.benchmark_return, epsilon = 1e-9);
        assert_relative_eq!(result.exposure, 1.0);
        assert!(result.max_drawdown < 0.0);
    }

    fn signals(pattern: &str) -> Vec<Signal> {
        pattern.chars().map(|c| Signal::from(c == 'L')).collect()
    }

    #[test]
    fn test_trades_follow_signal_transitions() {
        // 20 bars rising by 1 from 100
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let series = PriceSeries::from_closes(&closes).unwrap();
        let result = evaluate(&series, &signals("FFLLLFFFFLLFFFFFFFFF"));

        assert_eq!(result.total_trades, 2);
        let first = &result.trades[0];
        assert_eq!((first.entry_index, first.exit_index), (2, 5));
        assert_eq!(first.bars_held(), 3);
        assert!(!first.open);
        assert_relative_eq!(first.trade_return, 105.0 / 102.0 - 1.0, epsilon = 1e-12);

        let second = &result.trades[1];
        assert_eq!((second.entry_index, second.exit_index), (9, 11));
        assert_relative_eq!(result.win_rate, 1.0);
        assert_eq!(result.profit_factor, f64::INFINITY);

        // trades compound to the total return when flat in between
        let compounded = result
            .trades
            .iter()
            .fold(1.0, |acc, t| acc * (1.0 + t.trade_return));
        assert_relative_eq!(compounded - 1.0, result.total_return, epsilon = 1e-12);
    }

    #[test]
    fn test_open_trade_closes_on_last_bar() {
        let mut closes: Vec<f64> = vec![100.0; 15];
        closes.extend([90.0, 80.0, 85.0, 70.0, 75.0]);
        let series = PriceSeries::from_closes(&closes).unwrap();
        let result = evaluate(&series, &signals("FFFFFFFFFFFFFFLLLLLL"));

        assert_eq!(result.total_trades, 1);
        let trade = &result.trades[0];
        assert!(trade.open);
        assert_eq!((trade.entry_index, trade.exit_index), (14, 19));
        assert_relative_eq!(trade.trade_return, -0.25, epsilon = 1e-12);
        assert_eq!(result.win_rate, 0.0);
        assert_eq!(result.profit_factor, 0.0);
    }

    #[test]
    fn test_entry_on_last_bar_is_not_a_trade() {
        let series = PriceSeries::from_closes(&[100.0; 20]).unwrap();
        let result = evaluate(&series, &signals("FFFFFFFFFFFFFFFFFFFL"));
        assert!(result.trades.is_empty());
        assert_eq!(result.total_trades, 0);
    }

    #[test]
    fn test_profit_factor_mixes_wins_and_losses() {
        // up 10% in the first trade, down 5% in the second
        let mut closes = vec![100.0; 5];
        closes.extend([110.0, 110.0, 110.0, 104.5]);
        closes.extend(vec![104.5; 11]);
        let series = PriceSeries::from_closes(&closes).unwrap();
        let result = evaluate(&series, &signals("FFFFLFFLLFFFFFFFFFFF"));

        assert_eq!(result.total_trades, 2);
        assert_relative_eq!(result.win_rate, 0.5);
        assert_relative_eq!(result.profit_factor, 2.0, epsilon = 1e-9);
    }
}
