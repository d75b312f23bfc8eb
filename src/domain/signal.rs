//! Two-day decline entry signal.
//!
//! change[i] = (C[i] - C[i-1]) / C[i-1] * 100, absent for the first point.
//! signal[i] = change[i] < 0 && change[i-1] < 0, optionally also requiring
//! change[i] + change[i-1] < -min_cumulative_drop_pct.

use crate::domain::price::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SignalConfig {
    /// Minimum combined two-day drop, in percent. `None` disables the filter.
    pub min_cumulative_drop_pct: Option<f64>,
}

pub fn daily_changes(series: &PriceSeries) -> Vec<Option<f64>> {
    let points = series.points();
    if points.is_empty() {
        return Vec::new();
    }

    std::iter::once(None)
        .chain(
            points
                .windows(2)
                .map(|w| Some((w[1].close - w[0].close) / w[0].close * 100.0)),
        )
        .collect()
}

/// Same length as `changes`; the first two entries are always false.
pub fn signals_from_changes(changes: &[Option<f64>], config: &SignalConfig) -> Vec<bool> {
    let is_down = |c: Option<f64>| c.is_some_and(|v| v < 0.0);

    let mut signals = Vec::with_capacity(changes.len());
    if !changes.is_empty() {
        signals.push(false);
    }

    signals.extend(changes.windows(2).map(|w| {
        if !(is_down(w[0]) && is_down(w[1])) {
            return false;
        }
        match (config.min_cumulative_drop_pct, w[0], w[1]) {
            (Some(min_drop), Some(prev), Some(curr)) => prev + curr < -min_drop,
            _ => true,
        }
    }));

    signals
}

pub fn entry_signals(series: &PriceSeries, config: &SignalConfig) -> Vec<bool> {
    signals_from_changes(&daily_changes(series), config)
}

/// Size of the daily moves on signal days.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeclineStats {
    /// Mean daily change on signal days.
    pub average: Option<f64>,
    /// Most negative daily change on signal days.
    pub max: Option<f64>,
}

pub fn decline_stats(changes: &[Option<f64>], signals: &[bool]) -> DeclineStats {
    let declines: Vec<f64> = changes
        .iter()
        .zip(signals)
        .filter(|(_, signal)| **signal)
        .filter_map(|(change, _)| *change)
        .collect();

    if declines.is_empty() {
        return DeclineStats::default();
    }

    let average = declines.iter().sum::<f64>() / declines.len() as f64;
    let max = declines.iter().copied().fold(f64::INFINITY, f64::min);

    DeclineStats {
        average: Some(average),
        max: Some(max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PricePoint;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_series(prices: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: start + chrono::Duration::days(i as i64),
                close,
            })
            .collect();
        PriceSeries::new("TEST", points).unwrap()
    }

    #[test]
    fn changes_first_is_absent() {
        let changes = daily_changes(&make_series(&[100.0, 110.0, 99.0]));
        assert_eq!(changes.len(), 3);
        assert!(changes[0].is_none());
        assert_relative_eq!(changes[1].unwrap(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(changes[2].unwrap(), -10.0, epsilon = 1e-9);
    }

    #[test]
    fn changes_of_empty_series() {
        assert!(daily_changes(&PriceSeries::empty("X")).is_empty());
        assert!(entry_signals(&PriceSeries::empty("X"), &SignalConfig::default()).is_empty());
    }

    #[test]
    fn two_down_days_fire_signal() {
        let series = make_series(&[100.0, 98.0, 96.0, 98.0]);
        let signals = entry_signals(&series, &SignalConfig::default());
        assert_eq!(signals, vec![false, false, true, false]);
    }

    #[test]
    fn single_down_day_does_not_fire() {
        let series = make_series(&[100.0, 98.0, 99.0, 97.0]);
        let signals = entry_signals(&series, &SignalConfig::default());
        assert!(signals.iter().all(|s| !s));
    }

    #[test]
    fn consecutive_declines_keep_firing() {
        let series = make_series(&[10.0, 9.0, 8.0, 7.0, 6.0]);
        let signals = entry_signals(&series, &SignalConfig::default());
        assert_eq!(signals, vec![false, false, true, true, true]);
    }

    #[test]
    fn flat_day_breaks_the_pattern() {
        let signals = entry_signals(&make_series(&[10.0, 9.0, 9.0, 8.0]), &SignalConfig::default());
        assert!(signals.iter().all(|s| !s));
    }

    #[test]
    fn cumulative_filter_rejects_shallow_declines() {
        // -0.5% then -0.3%: two down days, combined drop below 1%
        let series = make_series(&[100.0, 99.5, 99.2015]);
        let plain = entry_signals(&series, &SignalConfig::default());
        assert!(plain[2]);

        let filtered = entry_signals(
            &series,
            &SignalConfig {
                min_cumulative_drop_pct: Some(1.0),
            },
        );
        assert!(!filtered[2]);
    }

    #[test]
    fn cumulative_filter_accepts_deep_declines() {
        let series = make_series(&[100.0, 98.0, 96.0]);
        let filtered = entry_signals(
            &series,
            &SignalConfig {
                min_cumulative_drop_pct: Some(1.0),
            },
        );
        assert_eq!(filtered, vec![false, false, true]);
    }

    #[test]
    fn decline_stats_over_signal_days() {
        let series = make_series(&[100.0, 90.0, 81.0, 72.9, 80.0]);
        let changes = daily_changes(&series);
        let signals = signals_from_changes(&changes, &SignalConfig::default());
        let stats = decline_stats(&changes, &signals);

        assert_relative_eq!(stats.average.unwrap(), -10.0, epsilon = 1e-9);
        assert_relative_eq!(stats.max.unwrap(), -10.0, epsilon = 1e-9);
    }

    #[test]
    fn decline_stats_max_is_most_negative() {
        let series = make_series(&[100.0, 99.0, 95.0, 90.0]);
        let changes = daily_changes(&series);
        let signals = signals_from_changes(&changes, &SignalConfig::default());
        let stats = decline_stats(&changes, &signals);

        let expected_max = (90.0 - 95.0) / 95.0 * 100.0;
        assert_relative_eq!(stats.max.unwrap(), expected_max, epsilon = 1e-9);
    }

    #[test]
    fn decline_stats_without_signals() {
        let series = make_series(&[100.0, 101.0, 102.0]);
        let changes = daily_changes(&series);
        let signals = signals_from_changes(&changes, &SignalConfig::default());
        assert_eq!(decline_stats(&changes, &signals), DeclineStats::default());
    }
}
