//! Capital trajectory: one point per closed trade.

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapitalPoint {
    pub date: NaiveDate,
    pub capital: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CapitalTrajectory {
    points: Vec<CapitalPoint>,
}

/// A trajectory point tagged with the instrument that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedCapitalPoint {
    pub instrument: String,
    pub date: NaiveDate,
    pub capital: f64,
}

impl CapitalTrajectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dates must not go backwards.
    pub fn record(&mut self, date: NaiveDate, capital: f64) {
        debug_assert!(self.points.last().is_none_or(|p| p.date <= date));
        self.points.push(CapitalPoint { date, capital });
    }

    pub fn points(&self) -> &[CapitalPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn final_capital(&self) -> Option<f64> {
        self.points.last().map(|p| p.capital)
    }

    /// Combines per-instrument trajectories into one date-ordered sequence.
    ///
    /// Ties on date keep the order of `trajectories`, then insertion order.
    pub fn merge<'a, I>(trajectories: I) -> Vec<MergedCapitalPoint>
    where
        I: IntoIterator<Item = (&'a str, &'a CapitalTrajectory)>,
    {
        let mut merged: Vec<MergedCapitalPoint> = trajectories
            .into_iter()
            .flat_map(|(instrument, trajectory)| {
                trajectory.points.iter().map(move |p| MergedCapitalPoint {
                    instrument: instrument.to_string(),
                    date: p.date,
                    capital: p.capital,
                })
            })
            .collect();
        merged.sort_by_key(|p| p.date);
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn new_trajectory_is_empty() {
        let t = CapitalTrajectory::new();
        assert!(t.is_empty());
        assert_eq!(t.final_capital(), None);
    }

    #[test]
    fn record_appends_in_order() {
        let mut t = CapitalTrajectory::new();
        t.record(day(3), 20_100.0);
        t.record(day(3), 20_050.0);
        t.record(day(9), 20_400.0);

        assert_eq!(t.len(), 3);
        assert_eq!(t.points()[1].capital, 20_050.0);
        assert_eq!(t.final_capital(), Some(20_400.0));
    }

    #[test]
    fn merge_orders_by_date_across_instruments() {
        let mut a = CapitalTrajectory::new();
        a.record(day(2), 1.0);
        a.record(day(8), 2.0);
        let mut b = CapitalTrajectory::new();
        b.record(day(1), 10.0);
        b.record(day(8), 20.0);

        let merged = CapitalTrajectory::merge([("A", &a), ("B", &b)]);

        let seq: Vec<(&str, u32)> = merged
            .iter()
            .map(|p| (p.instrument.as_str(), chrono::Datelike::day(&p.date)))
            .collect();
        assert_eq!(seq, vec![("B", 1), ("A", 2), ("A", 8), ("B", 8)]);
    }

    #[test]
    fn merge_leaves_inputs_untouched() {
        let mut a = CapitalTrajectory::new();
        a.record(day(2), 1.0);
        let before = a.clone();
        let _ = CapitalTrajectory::merge([("A", &a)]);
        assert_eq!(a, before);
    }
}
