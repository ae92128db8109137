//! Property tests for backtest and selection invariants.
//!
//! Uses proptest to verify:
//! 1. No look-ahead: a signal never changes when later bars are appended
//! 2. Drawdown sign: max drawdown is <= 0, and 0 exactly for non-decreasing equity
//! 3. Idempotence: regenerating signals on the same series gives the same frame
//! 4. Hysteresis: a position only flips on its entry or exit condition
//! 5. Sizing bound: a plan never commits more than the account
//! 6. Drawdown filter: a winner never breaches the configured limit

use proptest::prelude::*;
use std::collections::BTreeMap;
use strategy_scout::backtest::{self, equity_curve, max_drawdown};
use strategy_scout::risk::{trade_setup_with_atr, RiskManager};
use strategy_scout::scout::{Scout, ScoutConfig};
use strategy_scout::strategies::{MeanReversionParams, SearchGrid, StrategySpec};
use strategy_scout::{Direction, PriceSeries, Signal, Symbol};

// ── Strategies (proptest) ────────────────────────────────────────────

/// Random walk of daily closes starting at 100
fn arb_closes(min: usize, max: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.06..0.06_f64, min..max).prop_map(|moves| {
        moves
            .iter()
            .scan(100.0, |price, m| {
                *price *= 1.0 + m;
                Some((*price * 100.0).round() / 100.0)
            })
            .collect()
    })
}

fn arb_returns() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.2..0.2_f64, 1..200)
}

// ── 1. No Look-Ahead ─────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Signals up to bar t depend only on bars up to t.
    #[test]
    fn signals_ignore_future_bars(closes in arb_closes(220, 260)) {
        let full = PriceSeries::from_closes(&closes).unwrap();

        for spec in SearchGrid::full().candidates() {
            let full_signals = spec.generate_signals(&full).signals;
            for cut in [spec.lookback(), spec.lookback() + 7, closes.len() - 1] {
                if cut < spec.lookback() || cut > closes.len() {
                    continue;
                }
                let prefix = PriceSeries::from_closes(&closes[..cut]).unwrap();
                let prefix_signals = spec.generate_signals(&prefix).signals;
                prop_assert_eq!(&prefix_signals[..], &full_signals[..cut], "{} at cut {}", spec, cut);
            }
        }
    }

    /// The last bar's signal cannot earn anything inside the backtest.
    #[test]
    fn last_signal_does_not_affect_returns(closes in arb_closes(30, 80)) {
        let series = PriceSeries::from_closes(&closes).unwrap();
        let mut signals = vec![Signal::Long; closes.len()];
        let a = backtest::evaluate(&series, &signals);
        if let Some(last) = signals.last_mut() {
            *last = Signal::Flat;
        }
        let b = backtest::evaluate(&series, &signals);

        prop_assert_eq!(a.total_return, b.total_return);
        prop_assert_eq!(a.equity_curve, b.equity_curve);
    }
}

// ── 2. Drawdown Sign ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn drawdown_is_never_positive(returns in arb_returns()) {
        let curve = equity_curve(&returns);
        let dd = max_drawdown(&curve);
        prop_assert!(dd <= 0.0);

        let non_decreasing = curve.windows(2).all(|w| w[1] >= w[0]);
        prop_assert_eq!(dd == 0.0, non_decreasing);
    }

    #[test]
    fn gains_only_have_no_drawdown(returns in prop::collection::vec(0.0..0.1_f64, 1..100)) {
        prop_assert_eq!(max_drawdown(&equity_curve(&returns)), 0.0);
    }
}

// ── 3. Idempotence ───────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn signal_generation_is_idempotent(closes in arb_closes(60, 120)) {
        let series = PriceSeries::from_closes(&closes).unwrap();
        for spec in SearchGrid::full().candidates() {
            let first = spec.generate_signals(&series);
            let second = spec.generate_signals(&series);
            prop_assert_eq!(first.signals, second.signals);
        }
    }
}

// ── 4. Hysteresis ────────────────────────────────────────────────────

proptest! {
    /// Mean reversion only enters below `low` and only exits above `high`.
    #[test]
    fn mean_reversion_flips_only_on_thresholds(
        closes in arb_closes(40, 150),
        period in 2usize..15,
    ) {
        let params = MeanReversionParams { rsi_period: period, low: 30.0, high: 70.0 };
        let series = PriceSeries::from_closes(&closes).unwrap();
        let frame = StrategySpec::MeanReversion(params).generate_signals(&series);
        let rsi = frame.column("rsi").unwrap();

        let mut previous = Signal::Flat;
        for (t, signal) in frame.signals.iter().enumerate() {
            match (previous, *signal) {
                (Signal::Flat, Signal::Long) => {
                    prop_assert!(rsi[t].is_some_and(|r| r < 30.0))
                }
                (Signal::Long, Signal::Flat) => {
                    prop_assert!(rsi[t].is_some_and(|r| r > 70.0))
                }
                (Signal::Long, Signal::Long) => {
                    prop_assert!(!rsi[t].is_some_and(|r| r > 70.0))
                }
                (Signal::Flat, Signal::Flat) => {
                    prop_assert!(!rsi[t].is_some_and(|r| r < 30.0))
                }
            }
            previous = *signal;
        }
    }
}

// ── 5. Sizing Bound ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn position_never_exceeds_account(
        account in 100.0..1_000_000.0_f64,
        risk_fraction in 0.001..0.1_f64,
        entry in 0.5..5_000.0_f64,
        atr in 0.001..50.0_f64,
        multiplier in 0.5..4.0_f64,
        short in any::<bool>(),
    ) {
        let direction = if short { Direction::Short } else { Direction::Long };
        if let Some(setup) = trade_setup_with_atr(entry, atr, direction, multiplier, 2.0) {
            let units = RiskManager::calculate_position_size(account, risk_fraction, &setup).unwrap();
            prop_assert!(units >= 0.0);
            prop_assert!(units * entry <= account);
            prop_assert!(units * setup.risk_per_unit <= account * risk_fraction);
        }
    }
}

// ── 6. Drawdown Filter ───────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn winner_respects_drawdown_limit(
        closes in arb_closes(60, 200),
        limit in 0.05..0.6_f64,
    ) {
        let series = PriceSeries::from_closes(&closes).unwrap();
        let config = ScoutConfig {
            max_drawdown_limit: limit,
            use_strategy_map: false,
            ..ScoutConfig::default()
        };
        let scout = Scout::new(config, BTreeMap::new());

        if let Some(winner) = scout.optimize(&Symbol::new("RAND"), &series) {
            prop_assert!(winner.result.max_drawdown >= -limit);
            prop_assert!(winner.score.is_finite());
        }
    }
}
