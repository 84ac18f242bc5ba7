/// Data source clients.
///
/// Each upstream API gets its own file; the pipeline only depends on the
/// `ObservationSource` trait so the history collector can be driven by a
/// stub in tests.

pub mod power;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::model::{Coordinate, ForecastError, ObservationSeries};
use chrono::NaiveDate;

/// Something that can return hourly observations for an inclusive date range
/// at one coordinate.
///
/// Implementations are shared across worker threads, hence `Send + Sync`.
pub trait ObservationSource: Send + Sync {
    fn fetch(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        coordinate: Coordinate,
    ) -> Result<ObservationSeries, ForecastError>;
}
