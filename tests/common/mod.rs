#![allow(dead_code)]

use chrono::NaiveDate;
use dipbuyer::domain::error::DipbuyerError;
use dipbuyer::domain::price::{PricePoint, PriceSeries};
use dipbuyer::domain::strategy::StrategyConfig;
use dipbuyer::ports::data_port::PriceSeriesProvider;
use std::cell::Cell;
use std::collections::BTreeMap;

pub struct MockProvider {
    pub data: BTreeMap<String, Vec<PricePoint>>,
    pub errors: BTreeMap<String, String>,
    pub fail_list: bool,
    pub unavailable: Vec<String>,
    pub fetch_calls: Cell<usize>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
            errors: BTreeMap::new(),
            fail_list: false,
            unavailable: Vec::new(),
            fetch_calls: Cell::new(0),
        }
    }

    pub fn with_prices(mut self, instrument: &str, prices: &[f64]) -> Self {
        self.data.insert(instrument.to_string(), make_points(prices));
        self
    }

    pub fn with_points(mut self, instrument: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(instrument.to_string(), points);
        self
    }

    pub fn with_error(mut self, instrument: &str, reason: &str) -> Self {
        self.errors.insert(instrument.to_string(), reason.to_string());
        self
    }

    /// Fetching this instrument reports the whole store as unreachable.
    pub fn unavailable_at(mut self, instrument: &str) -> Self {
        self.unavailable.push(instrument.to_string());
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }
}

impl PriceSeriesProvider for MockProvider {
    fn list_instruments(&self) -> Result<Vec<String>, DipbuyerError> {
        if self.fail_list {
            return Err(DipbuyerError::DataUnavailable {
                reason: "connection refused".into(),
            });
        }
        Ok(self.data.keys().chain(self.errors.keys()).cloned().collect())
    }

    fn fetch_series(&self, instrument: &str) -> Result<PriceSeries, DipbuyerError> {
        self.fetch_calls.set(self.fetch_calls.get() + 1);
        if self.unavailable.iter().any(|i| i == instrument) {
            return Err(DipbuyerError::DataUnavailable {
                reason: "connection pool exhausted".into(),
            });
        }
        if let Some(reason) = self.errors.get(instrument) {
            return Err(DipbuyerError::DatabaseQuery {
                reason: reason.clone(),
            });
        }
        match self.data.get(instrument) {
            Some(points) => PriceSeries::new(instrument, points.clone()),
            None => Ok(PriceSeries::empty(instrument)),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Day 1 is 2024-01-01; consecutive calendar days.
pub fn day(n: i64) -> NaiveDate {
    date(2024, 1, 1) + chrono::Duration::days(n - 1)
}

pub fn make_points(prices: &[f64]) -> Vec<PricePoint> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            date: day(i as i64 + 1),
            close,
        })
        .collect()
}

pub fn make_series(instrument: &str, prices: &[f64]) -> PriceSeries {
    PriceSeries::new(instrument, make_points(prices)).unwrap()
}

/// No transaction costs, so prices in tests map directly to returns.
pub fn frictionless() -> StrategyConfig {
    StrategyConfig {
        transaction_cost_pips: 0.0,
        ..StrategyConfig::default()
    }
}
