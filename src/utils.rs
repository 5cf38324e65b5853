use crate::error::{FacilityFinancialsError, Result};
use chrono::{Datelike, NaiveDate};

/// Calendar-month distance from `start` to `end`, ignoring the day of month.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let year_diff = end.year() - start.year();
    let month_diff = end.month() as i32 - start.month() as i32;
    year_diff * 12 + month_diff
}

/// First day of the month named by a canonical `YYYY-MM` key.
pub fn period_start_date(period: &str) -> Option<NaiveDate> {
    let (year, month) = period.trim().split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

pub fn parse_period_key(period: &str) -> Result<NaiveDate> {
    period_start_date(period)
        .ok_or_else(|| FacilityFinancialsError::InvalidPeriod(period.to_string()))
}

pub fn period_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// The canonical key `offset` months after `period`.
pub fn shift_period(period: &str, offset: u32) -> Result<String> {
    let start = parse_period_key(period)?;
    start
        .checked_add_months(chrono::Months::new(offset))
        .map(period_key)
        .ok_or_else(|| FacilityFinancialsError::InvalidPeriod(period.to_string()))
}

/// Same month one year earlier, used to line up year-over-year comparisons.
pub fn prior_year_period(period: &str) -> Result<String> {
    let start = parse_period_key(period)?;
    start
        .checked_sub_months(chrono::Months::new(12))
        .map(period_key)
        .ok_or_else(|| FacilityFinancialsError::InvalidPeriod(period.to_string()))
}
