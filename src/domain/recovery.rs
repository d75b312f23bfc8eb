//! Recovery study: how often does a two-day decline bounce back?
//!
//! Every entry signal is judged on its own, with no capital, costs or cooling.
//! A signal at point i recovers if any close in C[i+1 ..= i+window] is
//! strictly above C[i] * (1 + threshold / 100).

use serde::Serialize;

use super::metrics::recovery_probability;
use super::price::PriceSeries;
use super::signal::{daily_changes, decline_stats, signals_from_changes, SignalConfig};
use super::strategy::StrategyConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryConfig {
    pub threshold_pct: f64,
    pub window: usize,
    pub signal: SignalConfig,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        RecoveryConfig::from(&StrategyConfig::analysis_variant())
    }
}

impl From<&StrategyConfig> for RecoveryConfig {
    fn from(strategy: &StrategyConfig) -> Self {
        RecoveryConfig {
            threshold_pct: strategy.recovery_threshold_pct,
            window: strategy.lookahead_days,
            signal: strategy.signal_config(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryStats {
    pub instrument: String,
    pub average_decline_pct: Option<f64>,
    pub max_decline_pct: Option<f64>,
    pub recovery_count: usize,
    pub no_recovery_count: usize,
    pub recovery_probability: f64,
}

pub fn analyse_recovery(series: &PriceSeries, config: &RecoveryConfig) -> RecoveryStats {
    let changes = daily_changes(series);
    let signals = signals_from_changes(&changes, &config.signal);
    let declines = decline_stats(&changes, &signals);
    let closes: Vec<f64> = series.closes().collect();

    let (recovered, missed): (Vec<usize>, Vec<usize>) = signals
        .iter()
        .enumerate()
        .filter(|(_, signal)| **signal)
        .map(|(i, _)| i)
        .partition(|&i| {
            let target = closes[i] * (1.0 + config.threshold_pct / 100.0);
            let end = (i + 1 + config.window).min(closes.len());
            closes[i + 1..end].iter().any(|&c| c > target)
        });

    RecoveryStats {
        instrument: series.instrument().to_string(),
        average_decline_pct: declines.average,
        max_decline_pct: declines.max,
        recovery_count: recovered.len(),
        no_recovery_count: missed.len(),
        recovery_probability: recovery_probability(recovered.len(), missed.len()),
    }
}
