//! Trend residency: share of days closing above the simple moving average.
//!
//! SMA(n)[i] = mean(C[i-n+1 ..= i]); the first (n-1) points have no SMA and
//! never count as "above".

use serde::Serialize;

use super::price::PriceSeries;

pub const DEFAULT_SMA_PERIOD: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResidency {
    pub instrument: String,
    pub period: usize,
    pub days_above: usize,
    pub total_days: usize,
    pub pct_above: f64,
}

/// Mean of each trailing window of closes; `None` during warmup. A zero
/// period yields no values.
///
/// Each window is averaged on its own, as offsets from its first close, so a
/// flat stretch averages to exactly its close however long the history
/// before it.
pub fn simple_moving_average(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || closes.len() < period {
        return vec![None; closes.len()];
    }

    let mut values = vec![None; period - 1];
    values.extend(closes.windows(period).map(|window| {
        let base = window[0];
        let offset = window.iter().map(|c| c - base).sum::<f64>() / period as f64;
        Some(base + offset)
    }));
    values
}

pub fn trend_residency(series: &PriceSeries, period: usize) -> TrendResidency {
    let closes: Vec<f64> = series.closes().collect();
    let sma = simple_moving_average(&closes, period);

    let days_above = closes
        .iter()
        .zip(&sma)
        .filter(|(close, avg)| avg.is_some_and(|a| **close > a))
        .count();
    let total_days = closes.len();
    let pct_above = if total_days > 0 {
        days_above as f64 / total_days as f64 * 100.0
    } else {
        0.0
    };

    TrendResidency {
        instrument: series.instrument().to_string(),
        period,
        days_above,
        total_days,
        pct_above,
    }
}
