//! Data access port trait.

use crate::domain::error::RegimetraderError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `ticker` within `[start_date, end_date]`, date ascending.
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, RegimetraderError>;

    /// First date, last date and bar count for `ticker`, or `None` when the
    /// source has no rows for it.
    fn data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RegimetraderError>;
}
