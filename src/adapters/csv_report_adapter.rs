//! CSV report and trade-log writers.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::error::DipbuyerError;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::portfolio::MergedCapitalPoint;
use crate::domain::position::TradeLogEntry;
use crate::domain::universe::SkippedInstrument;
use crate::ports::report_port::{ReportPort, TradeLogPort};

#[derive(Debug, Serialize)]
struct SkippedRow<'a> {
    instrument: &'a str,
    reason: String,
}

fn export_error(path: &Path, reason: impl ToString) -> DipbuyerError {
    DipbuyerError::Export {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Writes one CSV file with a header row taken from `T`'s field names.
///
/// Parent directories are created as needed. An empty slice still produces
/// a file, header-less, so a previous run's output never lingers.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), DipbuyerError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| export_error(path, e))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| export_error(path, e))?;
    for record in records {
        writer.serialize(record).map_err(|e| export_error(path, e))?;
    }
    writer.flush().map_err(|e| export_error(path, e))?;

    info!(path = %path.display(), rows = records.len(), "wrote csv");
    Ok(())
}

pub struct CsvReportAdapter {
    summary_path: PathBuf,
    skipped_path: Option<PathBuf>,
    trajectory_path: Option<PathBuf>,
}

impl CsvReportAdapter {
    pub fn new(summary_path: PathBuf) -> Self {
        Self {
            summary_path,
            skipped_path: None,
            trajectory_path: None,
        }
    }

    pub fn with_skipped(mut self, path: PathBuf) -> Self {
        self.skipped_path = Some(path);
        self
    }

    pub fn with_trajectory(mut self, path: PathBuf) -> Self {
        self.trajectory_path = Some(path);
        self
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_summaries(
        &self,
        summaries: &[PerformanceSummary],
        skipped: &[SkippedInstrument],
    ) -> Result<(), DipbuyerError> {
        write_records(&self.summary_path, summaries)?;

        if let Some(path) = &self.skipped_path {
            let rows: Vec<SkippedRow> = skipped
                .iter()
                .map(|s| SkippedRow {
                    instrument: &s.instrument,
                    reason: s.reason.to_string(),
                })
                .collect();
            write_records(path, &rows)?;
        }
        Ok(())
    }

    fn write_trajectory(&self, trajectory: &[MergedCapitalPoint]) -> Result<(), DipbuyerError> {
        match &self.trajectory_path {
            Some(path) => write_records(path, trajectory),
            None => Ok(()),
        }
    }
}

pub struct CsvTradeLogAdapter {
    path: PathBuf,
}

impl CsvTradeLogAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TradeLogPort for CsvTradeLogAdapter {
    fn export(&self, trades: &[TradeLogEntry]) -> Result<(), DipbuyerError> {
        write_records(&self.path, trades)
    }
}
