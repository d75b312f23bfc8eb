//! Position simulator: the per-instrument state machine.
//!
//! Each date is processed once, in order:
//! 1. close the open position if its resolved exit falls on this date
//! 2. skip the date while in a position or inside a cooling window
//! 3. open a position on an entry signal, resolving its exit immediately
//!
//! Closing a position books the trade, updates capital and the loss streak,
//! and appends to the capital trajectory.

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::cooling::{CoolingController, CoolingState};
use super::portfolio::CapitalTrajectory;
use super::position::{resolve_exit, ExitPlan, Position, TradeLogEntry};
use super::price::PriceSeries;
use super::signal::entry_signals;
use super::strategy::StrategyConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum SimState {
    Idle,
    Cooling { since: NaiveDate },
    InPosition { position: Position, exit: ExitPlan },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub trades: Vec<TradeLogEntry>,
    pub trajectory: CapitalTrajectory,
    pub final_capital: f64,
    pub recovery_count: usize,
    pub no_recovery_count: usize,
}

impl SimulationResult {
    pub fn closed_trades(&self) -> usize {
        self.recovery_count + self.no_recovery_count
    }
}

pub struct Simulator<'a> {
    series: &'a PriceSeries,
    signals: Vec<bool>,
    config: &'a StrategyConfig,
    state: SimState,
    cooling: CoolingController,
    capital: f64,
    trades: Vec<TradeLogEntry>,
    trajectory: CapitalTrajectory,
    recovery_count: usize,
    no_recovery_count: usize,
}

impl<'a> Simulator<'a> {
    pub fn new(series: &'a PriceSeries, config: &'a StrategyConfig) -> Self {
        Self::with_signals(series, entry_signals(series, &config.signal_config()), config)
    }

    /// `signals` must have one entry per price point.
    pub fn with_signals(
        series: &'a PriceSeries,
        signals: Vec<bool>,
        config: &'a StrategyConfig,
    ) -> Self {
        debug_assert_eq!(signals.len(), series.len());
        Simulator {
            series,
            signals,
            config,
            state: SimState::Idle,
            cooling: CoolingController::new(config.cooling_period_days),
            capital: config.initial_capital,
            trades: Vec::new(),
            trajectory: CapitalTrajectory::new(),
            recovery_count: 0,
            no_recovery_count: 0,
        }
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn trades(&self) -> &[TradeLogEntry] {
        &self.trades
    }

    pub fn cooling_state(&self) -> CoolingState {
        let since = match self.state {
            SimState::Cooling { since } => Some(since),
            _ => None,
        };
        self.cooling.state(since)
    }

    /// Advances the machine over the point at `index`.
    pub fn step(&mut self, index: usize) {
        let date = self.series.points()[index].date;

        let exit_due =
            matches!(&self.state, SimState::InPosition { exit, .. } if exit.index == index);
        if exit_due {
            self.close_position();
        }

        match self.state {
            SimState::InPosition { .. } => return,
            SimState::Cooling { since } => {
                if !self.cooling.has_elapsed(since, date) {
                    return;
                }
                debug!(instrument = self.series.instrument(), %date, "cooling period over");
                self.state = SimState::Idle;
                self.cooling.reset();
            }
            SimState::Idle => {}
        }

        if self.signals[index] {
            self.open_position(index);
        }
    }

    pub fn run(mut self) -> SimulationResult {
        for index in 0..self.series.len() {
            self.step(index);
        }
        self.finish()
    }

    fn finish(self) -> SimulationResult {
        SimulationResult {
            trades: self.trades,
            trajectory: self.trajectory,
            final_capital: self.capital,
            recovery_count: self.recovery_count,
            no_recovery_count: self.no_recovery_count,
        }
    }

    fn open_position(&mut self, index: usize) {
        let point = self.series.points()[index];
        let position = Position::open(index, point, self.capital, self.config.transaction_cost());
        let exit = resolve_exit(self.series.points(), &position, self.config);

        debug!(
            instrument = self.series.instrument(),
            date = %point.date,
            entry_price = position.entry_price,
            exit_date = %exit.date,
            outcome = %exit.outcome,
            "opened position"
        );

        let closes_now = exit.index == index;
        self.state = SimState::InPosition { position, exit };
        if closes_now {
            self.close_position();
        }
    }

    fn close_position(&mut self) {
        let SimState::InPosition { position, exit } =
            std::mem::replace(&mut self.state, SimState::Idle)
        else {
            return;
        };

        let capital_after = position.capital_after(exit.price);
        let return_pct =
            (capital_after - position.capital_before) / position.capital_before * 100.0;
        self.capital = capital_after;

        if exit.outcome.is_recovery() {
            self.recovery_count += 1;
        } else {
            self.no_recovery_count += 1;
        }

        let entry = TradeLogEntry {
            instrument: self.series.instrument().to_string(),
            entry_date: position.entry_date,
            exit_date: exit.date,
            entry_price: position.entry_price,
            exit_price: exit.price,
            outcome: exit.outcome,
            capital_after,
            return_pct,
        };
        match self.trades.last() {
            Some(previous) if previous.exit_date > entry.entry_date => {
                warn!(
                    instrument = self.series.instrument(),
                    entry_date = %entry.entry_date,
                    previous_exit = %previous.exit_date,
                    "overlapping trade left out of the log"
                );
            }
            _ => self.trades.push(entry),
        }

        if self.cooling.record_trade(return_pct) {
            debug!(
                instrument = self.series.instrument(),
                since = %exit.date,
                "cooling period started"
            );
            self.state = SimState::Cooling { since: exit.date };
        }

        self.trajectory.record(exit.date, capital_after);
    }
}

/// Runs the strategy over one price series.
pub fn simulate(series: &PriceSeries, config: &StrategyConfig) -> SimulationResult {
    Simulator::new(series, config).run()
}
