//! Daily history access port.

use crate::domain::error::AdrError;
use crate::domain::ohlcv::DailyBar;
use chrono::NaiveDate;

pub trait HistoryPort {
    /// Bars for `instrument` with `start <= date <= end`, ascending by date.
    ///
    /// Fails with [`AdrError::DataUnavailable`] when the instrument is unknown
    /// or the source cannot be reached.
    fn fetch_daily_history(
        &self,
        instrument: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, AdrError>;

    /// First date, last date and bar count held for `instrument`.
    fn get_data_range(
        &self,
        instrument: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AdrError>;
}

impl<P: HistoryPort + ?Sized> HistoryPort for Box<P> {
    fn fetch_daily_history(
        &self,
        instrument: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, AdrError> {
        (**self).fetch_daily_history(instrument, start, end)
    }

    fn get_data_range(
        &self,
        instrument: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AdrError> {
        (**self).get_data_range(instrument)
    }
}
