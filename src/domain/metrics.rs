//! Performance summary per instrument.

use chrono::NaiveDate;
use serde::Serialize;

use super::portfolio::CapitalPoint;
use super::price::PriceSeries;
use super::signal::DeclineStats;
use super::simulator::SimulationResult;

const DAYS_PER_YEAR: f64 = 365.25;

/// Beta(1, 1) prior on the recovery rate.
const PRIOR_ALPHA: f64 = 1.0;
const PRIOR_BETA: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub instrument: String,
    pub average_decline_pct: Option<f64>,
    pub max_decline_pct: Option<f64>,
    pub recovery_count: usize,
    pub no_recovery_count: usize,
    pub recovery_probability: f64,
    pub trade_count: usize,
    pub final_capital: f64,
    pub portfolio_return_pct: f64,
    /// `None` when the price history spans zero calendar days.
    pub annualized_return_pct: Option<f64>,
    pub max_drawdown_pct: f64,
    pub max_drawdown_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl PerformanceSummary {
    pub fn compute(
        series: &PriceSeries,
        simulation: &SimulationResult,
        initial_capital: f64,
        declines: DeclineStats,
    ) -> Self {
        let final_capital = simulation.final_capital;
        let (max_drawdown_pct, max_drawdown_date) =
            match compute_drawdown(simulation.trajectory.points()) {
                Some((dd, date)) => (dd, Some(date)),
                None => (0.0, None),
            };

        PerformanceSummary {
            instrument: series.instrument().to_string(),
            average_decline_pct: declines.average,
            max_decline_pct: declines.max,
            recovery_count: simulation.recovery_count,
            no_recovery_count: simulation.no_recovery_count,
            recovery_probability: recovery_probability(
                simulation.recovery_count,
                simulation.no_recovery_count,
            ),
            trade_count: simulation.trades.len(),
            final_capital,
            portfolio_return_pct: portfolio_return_pct(initial_capital, final_capital),
            annualized_return_pct: annualized_return_pct(
                initial_capital,
                final_capital,
                series.calendar_span_days(),
            ),
            max_drawdown_pct,
            max_drawdown_date,
            start_date: series.first_date(),
            end_date: series.last_date(),
        }
    }
}

pub fn portfolio_return_pct(initial_capital: f64, final_capital: f64) -> f64 {
    if initial_capital > 0.0 {
        (final_capital - initial_capital) / initial_capital * 100.0
    } else {
        0.0
    }
}

/// `((final / initial) ^ (365.25 / span) - 1) * 100`; `None` for a zero span.
pub fn annualized_return_pct(
    initial_capital: f64,
    final_capital: f64,
    span_days: i64,
) -> Option<f64> {
    if span_days <= 0 || initial_capital <= 0.0 {
        return None;
    }
    let growth = final_capital / initial_capital;
    let value = (growth.powf(DAYS_PER_YEAR / span_days as f64) - 1.0) * 100.0;
    value.is_finite().then_some(value)
}

/// Deepest drop from the running maximum, in percent (always <= 0), with the
/// date of its first occurrence. `None` for an empty trajectory.
pub fn compute_drawdown(trajectory: &[CapitalPoint]) -> Option<(f64, NaiveDate)> {
    let first = trajectory.first()?;

    let mut peak = first.capital;
    let mut worst = 0.0_f64;
    let mut worst_date = first.date;

    for point in trajectory {
        if point.capital > peak {
            peak = point.capital;
        }
        if peak > 0.0 {
            let dd = (point.capital - peak) / peak;
            if dd < worst {
                worst = dd;
                worst_date = point.date;
            }
        }
    }

    Some((worst * 100.0, worst_date))
}

/// Posterior mean of the recovery rate under a Beta(1, 1) prior.
pub fn recovery_probability(recovery_count: usize, no_recovery_count: usize) -> f64 {
    let alpha = PRIOR_ALPHA + recovery_count as f64;
    let beta = PRIOR_BETA + no_recovery_count as f64;
    alpha / (alpha + beta)
}
