//! Open positions, exit resolution and the trade log.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::domain::price::PricePoint;
use crate::domain::strategy::StrategyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitOutcome {
    Recovered,
    StoppedOut,
    TimedOut,
}

impl ExitOutcome {
    pub fn is_recovery(self) -> bool {
        matches!(self, ExitOutcome::Recovered)
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Recovered => write!(f, "recovered"),
            ExitOutcome::StoppedOut => write!(f, "stopped out"),
            ExitOutcome::TimedOut => write!(f, "timed out"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    /// Close plus transaction cost.
    pub entry_price: f64,
    pub capital_before: f64,
    pub shares: f64,
}

impl Position {
    pub fn open(
        entry_index: usize,
        point: PricePoint,
        capital: f64,
        transaction_cost: f64,
    ) -> Self {
        let entry_price = point.close + transaction_cost;
        Position {
            entry_index,
            entry_date: point.date,
            entry_price,
            capital_before: capital,
            shares: capital / entry_price,
        }
    }

    pub fn should_recover(&self, price: f64, config: &StrategyConfig) -> bool {
        price >= config.recovery_price(self.entry_price)
    }

    pub fn should_stop_loss(&self, price: f64, config: &StrategyConfig) -> bool {
        config
            .stop_price(self.entry_price)
            .is_some_and(|stop| price <= stop)
    }

    /// Capital after selling every share at `exit_price`.
    ///
    /// Written as a ratio so that exiting at the entry price returns exactly
    /// `capital_before`.
    pub fn capital_after(&self, exit_price: f64) -> f64 {
        self.capital_before * (exit_price / self.entry_price)
    }
}

/// Where and how a position leaves the market.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitPlan {
    pub index: usize,
    pub date: NaiveDate,
    /// Close minus transaction cost.
    pub price: f64,
    pub outcome: ExitOutcome,
}

/// Scans `points[entry+1 ..= entry+lookahead]` for the first recovery or stop.
///
/// Falls back to the last close in the window (`TimedOut`). With no points
/// after the entry the position exits on the entry date at the entry price.
pub fn resolve_exit(
    points: &[PricePoint],
    position: &Position,
    config: &StrategyConfig,
) -> ExitPlan {
    let cost = config.transaction_cost();
    let start = position.entry_index + 1;
    let end = (start + config.lookahead_days).min(points.len());

    if start >= end {
        return ExitPlan {
            index: position.entry_index,
            date: position.entry_date,
            price: position.entry_price,
            outcome: ExitOutcome::TimedOut,
        };
    }

    for (offset, point) in points[start..end].iter().enumerate() {
        let outcome = if position.should_recover(point.close, config) {
            ExitOutcome::Recovered
        } else if position.should_stop_loss(point.close, config) {
            ExitOutcome::StoppedOut
        } else {
            continue;
        };
        return ExitPlan {
            index: start + offset,
            date: point.date,
            price: point.close - cost,
            outcome,
        };
    }

    let last = points[end - 1];
    ExitPlan {
        index: end - 1,
        date: last.date,
        price: last.close - cost,
        outcome: ExitOutcome::TimedOut,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeLogEntry {
    pub instrument: String,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub outcome: ExitOutcome,
    pub capital_after: f64,
    pub return_pct: f64,
}
