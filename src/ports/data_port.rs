//! Price data access port.

use crate::domain::error::DipbuyerError;
use crate::domain::price::PriceSeries;

pub trait PriceSeriesProvider {
    /// Fails with `DataUnavailable` when the backing store cannot be reached.
    fn list_instruments(&self) -> Result<Vec<String>, DipbuyerError>;

    /// Returns an empty series, not an error, when the instrument has no data.
    fn fetch_series(&self, instrument: &str) -> Result<PriceSeries, DipbuyerError>;
}
