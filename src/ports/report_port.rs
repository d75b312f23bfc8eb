//! Output ports for backtest results.

use crate::domain::error::DipbuyerError;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::portfolio::MergedCapitalPoint;
use crate::domain::position::TradeLogEntry;
use crate::domain::universe::SkippedInstrument;

/// Port for writing per-instrument summaries.
pub trait ReportPort {
    fn write_summaries(
        &self,
        summaries: &[PerformanceSummary],
        skipped: &[SkippedInstrument],
    ) -> Result<(), DipbuyerError>;

    /// Default implementation: the combined trajectory is optional output.
    fn write_trajectory(&self, _trajectory: &[MergedCapitalPoint]) -> Result<(), DipbuyerError> {
        Ok(())
    }
}

/// Port for exporting the trade log.
pub trait TradeLogPort {
    fn export(&self, trades: &[TradeLogEntry]) -> Result<(), DipbuyerError>;
}
