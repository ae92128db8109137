//! Current-bar advice
//!
//! Reads a winner's signal on the last two bars and turns it into an action,
//! with a sized trade plan for fresh entries.

use serde::Serialize;
use std::fmt;

use crate::risk::{RiskManager, TradePlan};
use crate::scout::Winner;
use crate::{Direction, PriceSeries, Signal, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Signal turned on at the last bar
    Enter,
    /// Signal was already on
    Hold,
    /// Signal turned off at the last bar
    Exit,
    StayOut,
}

impl Action {
    pub fn from_signals(previous: Signal, current: Signal) -> Self {
        match (previous, current) {
            (Signal::Flat, Signal::Long) => Action::Enter,
            (Signal::Long, Signal::Long) => Action::Hold,
            (Signal::Long, Signal::Flat) => Action::Exit,
            (Signal::Flat, Signal::Flat) => Action::StayOut,
        }
    }

    pub fn is_actionable(self) -> bool {
        self == Action::Enter
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::Enter => "ENTER",
            Action::Hold => "HOLD",
            Action::Exit => "EXIT",
            Action::StayOut => "STAY OUT",
        };
        f.pad(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advice {
    pub symbol: Symbol,
    pub strategy: String,
    pub action: Action,
    pub last_close: f64,
    /// Present for entries when the ATR is defined
    pub plan: Option<TradePlan>,
}

/// Advice for `winner` on the latest bar of `series`
pub fn advise(winner: &Winner, series: &PriceSeries, risk: &RiskManager) -> Option<Advice> {
    let last_close = series.last()?.close;
    let frame = winner.spec.generate_signals(series);
    let action = Action::from_signals(frame.previous_signal(), frame.last_signal());

    let plan = if action.is_actionable() {
        risk.plan(series, last_close, Direction::Long)
    } else {
        None
    };

    Some(Advice {
        symbol: winner.symbol.clone(),
        strategy: winner.strategy.clone(),
        action,
        last_close,
        plan,
    })
}
