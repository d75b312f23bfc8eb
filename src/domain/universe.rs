//! Instrument universe and batch backtesting.
//!
//! All price series are fetched before any simulation starts. Instruments
//! that cannot be simulated are skipped with a reason. A data source that
//! cannot be reached at all, while listing or fetching, aborts the run.

use rayon::prelude::*;
use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::domain::error::DipbuyerError;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::portfolio::{CapitalTrajectory, MergedCapitalPoint};
use crate::domain::position::TradeLogEntry;
use crate::domain::price::PriceSeries;
use crate::domain::signal::{daily_changes, decline_stats, signals_from_changes};
use crate::domain::simulator::Simulator;
use crate::domain::strategy::StrategyConfig;
use crate::ports::data_port::PriceSeriesProvider;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in instrument list")]
    EmptyToken,

    #[error("duplicate instrument: {0}")]
    DuplicateInstrument(String),
}

pub fn parse_instruments(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut instruments = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        if !seen.insert(trimmed.to_string()) {
            return Err(UniverseError::DuplicateInstrument(trimmed.to_string()));
        }
        instruments.push(trimmed.to_string());
    }

    Ok(instruments)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    EmptySeries,
    FetchFailed(String),
    InvalidSeries(String),
    DeadlineExceeded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptySeries => write!(f, "no price data"),
            SkipReason::FetchFailed(reason) => write!(f, "fetch failed: {reason}"),
            SkipReason::InvalidSeries(reason) => write!(f, "invalid series: {reason}"),
            SkipReason::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedInstrument {
    pub instrument: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub parallel: bool,
    /// Checked between instruments while fetching.
    pub max_duration: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentResult {
    pub summary: PerformanceSummary,
    pub trades: Vec<TradeLogEntry>,
    pub trajectory: CapitalTrajectory,
}

#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub results: Vec<InstrumentResult>,
    pub skipped: Vec<SkippedInstrument>,
}

impl BatchResult {
    pub fn summaries(&self) -> Vec<PerformanceSummary> {
        self.results.iter().map(|r| r.summary.clone()).collect()
    }

    /// Trade logs of every instrument, in instrument order.
    pub fn trade_log(&self) -> Vec<TradeLogEntry> {
        self.results
            .iter()
            .flat_map(|r| r.trades.iter().cloned())
            .collect()
    }

    pub fn merged_trajectory(&self) -> Vec<MergedCapitalPoint> {
        CapitalTrajectory::merge(
            self.results
                .iter()
                .map(|r| (r.summary.instrument.as_str(), &r.trajectory)),
        )
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Full pipeline for one instrument. `None` for an empty series.
pub fn backtest_instrument(
    series: &PriceSeries,
    config: &StrategyConfig,
) -> Option<InstrumentResult> {
    if series.is_empty() {
        return None;
    }

    let changes = daily_changes(series);
    let signals = signals_from_changes(&changes, &config.signal_config());
    let declines = decline_stats(&changes, &signals);

    let simulation = Simulator::with_signals(series, signals, config).run();
    let summary =
        PerformanceSummary::compute(series, &simulation, config.initial_capital, declines);

    Some(InstrumentResult {
        summary,
        trades: simulation.trades,
        trajectory: simulation.trajectory,
    })
}

/// Fetches every instrument up front, sorting out the ones that cannot be used.
///
/// `DataUnavailable` and `Database` errors mean the store itself is gone and
/// are returned instead of being recorded as skips.
pub fn collect_series(
    provider: &dyn PriceSeriesProvider,
    instruments: &[String],
    max_duration: Option<Duration>,
) -> Result<(Vec<PriceSeries>, Vec<SkippedInstrument>), DipbuyerError> {
    let started = Instant::now();
    let mut series = Vec::with_capacity(instruments.len());
    let mut skipped = Vec::new();

    for (i, instrument) in instruments.iter().enumerate() {
        if max_duration.is_some_and(|limit| started.elapsed() >= limit) {
            warn!(
                remaining = instruments.len() - i,
                "deadline reached, skipping remaining instruments"
            );
            skipped.extend(instruments[i..].iter().map(|instrument| SkippedInstrument {
                instrument: instrument.clone(),
                reason: SkipReason::DeadlineExceeded,
            }));
            break;
        }

        let reason = match provider.fetch_series(instrument) {
            Ok(s) if s.is_empty() => {
                info!(instrument = %instrument, "no data available, skipping");
                SkipReason::EmptySeries
            }
            Ok(s) => {
                info!(instrument = %instrument, points = s.len(), "loaded price series");
                series.push(s);
                continue;
            }
            Err(DipbuyerError::InvalidSeries { reason, .. }) => {
                warn!(instrument = %instrument, %reason, "invalid price series, skipping");
                SkipReason::InvalidSeries(reason)
            }
            Err(e @ (DipbuyerError::DataUnavailable { .. } | DipbuyerError::Database { .. })) => {
                error!(instrument = %instrument, error = %e, "data source unavailable, aborting");
                return Err(e);
            }
            Err(e) => {
                warn!(instrument = %instrument, error = %e, "failed to fetch prices, skipping");
                SkipReason::FetchFailed(e.to_string())
            }
        };
        skipped.push(SkippedInstrument {
            instrument: instrument.clone(),
            reason,
        });
    }

    Ok((series, skipped))
}

/// Lists instruments from the provider unless an explicit list is given.
pub fn resolve_instruments(
    provider: &dyn PriceSeriesProvider,
    explicit: Option<Vec<String>>,
) -> Result<Vec<String>, DipbuyerError> {
    match explicit {
        Some(list) => Ok(list),
        None => provider.list_instruments(),
    }
}

pub fn run_batch(
    provider: &dyn PriceSeriesProvider,
    instruments: &[String],
    config: &StrategyConfig,
    options: &BatchOptions,
) -> Result<BatchResult, DipbuyerError> {
    let (series, mut skipped) = collect_series(provider, instruments, options.max_duration)?;

    info!(
        instruments = series.len(),
        skipped = skipped.len(),
        parallel = options.parallel,
        "running backtest"
    );

    let outcomes: Vec<Option<InstrumentResult>> = if options.parallel {
        series
            .par_iter()
            .map(|s| backtest_instrument(s, config))
            .collect()
    } else {
        series
            .iter()
            .map(|s| backtest_instrument(s, config))
            .collect()
    };

    let mut results = Vec::with_capacity(outcomes.len());
    for (s, outcome) in series.iter().zip(outcomes) {
        match outcome {
            Some(result) => results.push(result),
            None => skipped.push(SkippedInstrument {
                instrument: s.instrument().to_string(),
                reason: SkipReason::EmptySeries,
            }),
        }
    }

    if !skipped.is_empty() {
        info!(
            "backtested {} of {} instruments",
            results.len(),
            results.len() + skipped.len()
        );
    }

    Ok(BatchResult { results, skipped })
}
