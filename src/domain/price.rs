//! Daily closing-price series.

use crate::domain::error::DipbuyerError;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Chronologically ordered closes for one instrument.
///
/// Dates are strictly increasing and every close is finite and positive.
/// Gaps between dates are allowed and never filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    instrument: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(
        instrument: impl Into<String>,
        points: Vec<PricePoint>,
    ) -> Result<Self, DipbuyerError> {
        let instrument = instrument.into();

        for (i, point) in points.iter().enumerate() {
            if !point.close.is_finite() || point.close <= 0.0 {
                return Err(DipbuyerError::InvalidSeries {
                    instrument,
                    reason: format!("non-positive close {} on {}", point.close, point.date),
                });
            }
            if i > 0 && points[i - 1].date >= point.date {
                return Err(DipbuyerError::InvalidSeries {
                    instrument,
                    reason: format!(
                        "dates not strictly increasing at {} (after {})",
                        point.date,
                        points[i - 1].date
                    ),
                });
            }
        }

        Ok(Self { instrument, points })
    }

    /// Sorts by date before validating. Duplicate dates are still rejected.
    pub fn from_unsorted(
        instrument: impl Into<String>,
        mut points: Vec<PricePoint>,
    ) -> Result<Self, DipbuyerError> {
        points.sort_by_key(|p| p.date);
        Self::new(instrument, points)
    }

    pub fn empty(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            points: Vec::new(),
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Calendar days between the first and last point; 0 below two points.
    pub fn calendar_span_days(&self) -> i64 {
        match (self.first_date(), self.last_date()) {
            (Some(first), Some(last)) => (last - first).num_days(),
            _ => 0,
        }
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.close)
    }
}
