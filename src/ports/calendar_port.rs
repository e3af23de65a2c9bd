//! Calendar conversion port.

use crate::domain::error::LedgerError;
use chrono::NaiveDate;

pub trait CalendarPort {
    /// Convert a date in the source calendar into a Gregorian date.
    fn to_gregorian(&self, raw: &str) -> Result<NaiveDate, LedgerError>;

    /// Signed day count from `from` to `to`.
    fn days_between(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        (to - from).num_days()
    }
}
