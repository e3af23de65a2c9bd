//! Calendar adapters: Jalali (Solar Hijri) and Gregorian.

use crate::domain::error::LedgerError;
use crate::ports::calendar_port::CalendarPort;
use chrono::NaiveDate;

/// Day number of 0001-01-01 counted from 0000-01-01 (year 0 is a leap year).
const DAYS_BEFORE_COMMON_ERA: i64 = 365;

/// Largest Jalali year accepted; keeps the day arithmetic far from overflow.
const MAX_JALALI_YEAR: i64 = 9999;

fn invalid_date(value: &str, reason: impl Into<String>) -> LedgerError {
    LedgerError::InvalidDate {
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Split `Y/M/D` or `Y-M-D` into numbers.
fn split_ymd(raw: &str) -> Result<(i64, u32, u32), LedgerError> {
    let parts: Vec<&str> = raw.trim().split(['/', '-']).collect();
    if parts.len() != 3 {
        return Err(invalid_date(raw, "expected year/month/day"));
    }
    let year: i64 = parts[0]
        .trim()
        .parse()
        .map_err(|e| invalid_date(raw, format!("invalid year: {e}")))?;
    let month: u32 = parts[1]
        .trim()
        .parse()
        .map_err(|e| invalid_date(raw, format!("invalid month: {e}")))?;
    let day: u32 = parts[2]
        .trim()
        .parse()
        .map_err(|e| invalid_date(raw, format!("invalid day: {e}")))?;
    Ok((year, month, day))
}

/// Solar Hijri calendar used by the Tehran exchanges, written `1402/12/11`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JalaliCalendar;

impl JalaliCalendar {
    /// Days since 0000-01-01 (proleptic Gregorian) of a Jalali date.
    fn day_number(year: i64, month: u32, day: u32) -> i64 {
        let jy = year + 1595;
        let mut days = -355_668 + 365 * jy + (jy / 33) * 8 + ((jy % 33) + 3) / 4 + day as i64;
        let month = month as i64;
        if month < 7 {
            days += (month - 1) * 31;
        } else {
            days += (month - 7) * 30 + 186;
        }
        days
    }

    pub fn to_date(year: i64, month: u32, day: u32) -> Option<NaiveDate> {
        let max_day = match month {
            1..=6 => 31,
            7..=12 => 30,
            _ => return None,
        };
        if !(1..=MAX_JALALI_YEAR).contains(&year) || day == 0 || day > max_day {
            return None;
        }
        let ordinal = Self::day_number(year, month, day) - DAYS_BEFORE_COMMON_ERA;
        NaiveDate::from_num_days_from_ce_opt(i32::try_from(ordinal).ok()?)
    }
}

impl CalendarPort for JalaliCalendar {
    fn to_gregorian(&self, raw: &str) -> Result<NaiveDate, LedgerError> {
        let (year, month, day) = split_ymd(raw)?;
        Self::to_date(year, month, day).ok_or_else(|| invalid_date(raw, "not a valid Jalali date"))
    }
}

/// Dates already in the Gregorian calendar, written `2024-03-20` or `2024/03/20`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GregorianCalendar;

impl CalendarPort for GregorianCalendar {
    fn to_gregorian(&self, raw: &str) -> Result<NaiveDate, LedgerError> {
        let (year, month, day) = split_ymd(raw)?;
        let year = i32::try_from(year).map_err(|_| invalid_date(raw, "year out of range"))?;
        NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| invalid_date(raw, "not a valid Gregorian date"))
    }
}
