//! CSV directory price adapter.
//!
//! One file per instrument, `<INSTRUMENT>.csv`, with a `date,close` header.

use crate::domain::error::DipbuyerError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::data_port::PriceSeriesProvider;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const EXTENSION: &str = "csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, instrument: &str) -> PathBuf {
        self.base_path.join(format!("{}.{}", instrument, EXTENSION))
    }

    fn ensure_base_path(&self) -> Result<(), DipbuyerError> {
        if self.base_path.is_dir() {
            Ok(())
        } else {
            Err(DipbuyerError::DataUnavailable {
                reason: format!("data directory {} not found", self.base_path.display()),
            })
        }
    }
}

fn parse_row(record: &csv::StringRecord, line: u64) -> Result<PricePoint, DipbuyerError> {
    let date_str = record.get(0).ok_or_else(|| DipbuyerError::DatabaseQuery {
        reason: format!("line {}: missing date column", line),
    })?;
    let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
        DipbuyerError::DatabaseQuery {
            reason: format!("line {}: invalid date '{}': {}", line, date_str, e),
        }
    })?;

    let close: f64 = record
        .get(1)
        .ok_or_else(|| DipbuyerError::DatabaseQuery {
            reason: format!("line {}: missing close column", line),
        })?
        .trim()
        .parse()
        .map_err(|e| DipbuyerError::DatabaseQuery {
            reason: format!("line {}: invalid close value: {}", line, e),
        })?;

    Ok(PricePoint { date, close })
}

impl PriceSeriesProvider for CsvAdapter {
    fn list_instruments(&self) -> Result<Vec<String>, DipbuyerError> {
        self.ensure_base_path()?;
        let entries = fs::read_dir(&self.base_path).map_err(|e| DipbuyerError::DataUnavailable {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut instruments = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DipbuyerError::DataUnavailable {
                reason: format!("directory entry error: {}", e),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == EXTENSION) {
                if let Some(stem) = path.file_stem() {
                    instruments.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        instruments.sort();
        Ok(instruments)
    }

    fn fetch_series(&self, instrument: &str) -> Result<PriceSeries, DipbuyerError> {
        self.ensure_base_path()?;
        let path = self.csv_path(instrument);
        if !path.exists() {
            debug!(instrument, path = %path.display(), "no csv file for instrument");
            return Ok(PriceSeries::empty(instrument));
        }

        let mut rdr = csv::Reader::from_path(&path).map_err(|e| DipbuyerError::DatabaseQuery {
            reason: format!("failed to open {}: {}", path.display(), e),
        })?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| DipbuyerError::DatabaseQuery {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            let line = record.position().map_or(0, |p| p.line());
            points.push(parse_row(&record, line)?);
        }

        PriceSeries::from_unsorted(instrument, points)
    }
}
