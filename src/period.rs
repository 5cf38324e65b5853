//! Normalization of the many ways spreadsheets spell a month into the
//! canonical `YYYY-MM` key.
//!
//! Resolution order, first success wins:
//! 1. a general calendar-date parse (ISO dates, `Month YYYY`, `MM/DD/YYYY`, ...)
//! 2. text that already is `YYYY-MM`
//! 3. `MM/YYYY`
//!
//! Anything else, including year-less forms such as `01/02`, is unparseable
//! and yields `None`.

use crate::utils::{period_key, period_start_date};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static CANONICAL_PERIOD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}$").unwrap());
static MONTH_SLASH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{4})$").unwrap());

static EMBEDDED_ISO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{2})\b").unwrap());
static EMBEDDED_MONTH_SLASH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{4})\b").unwrap());
static EMBEDDED_MONTH_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?[\s\-']*(\d{4})\b",
    )
    .unwrap()
});

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

// Month-level formats, parsed with a synthetic day prefix since chrono needs a full date.
// Two-digit years go first: `%Y` would happily read "Jan-24" as year 24.
// Tried before DATE_FORMATS, where `%B %d %Y` reads "March 2024" as March 20 of year 24.
const MONTH_FORMATS: &[&str] = &["%B %y", "%B-%y", "%B %Y", "%B-%Y"];

pub fn normalize_period(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(date) = parse_calendar_date(text) {
        return Some(period_key(date));
    }

    if CANONICAL_PERIOD.is_match(text) {
        return period_start_date(text).map(period_key);
    }

    if let Some(caps) = MONTH_SLASH_YEAR.captures(text) {
        let month: u32 = caps[1].parse().ok()?;
        let year: i32 = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1).map(period_key);
    }

    None
}

pub fn is_canonical_period(text: &str) -> bool {
    CANONICAL_PERIOD.is_match(text) && period_start_date(text).is_some()
}

/// Finds a period inside a longer header such as `"Actual 2024-01"` or `"Jan 2024 Actual"`.
pub fn find_period_token(text: &str) -> Option<String> {
    if let Some(period) = normalize_period(text) {
        return Some(period);
    }

    if let Some(m) = EMBEDDED_ISO.find(text) {
        if let Some(period) = normalize_period(m.as_str()) {
            return Some(period);
        }
    }

    if let Some(m) = EMBEDDED_MONTH_SLASH_YEAR.find(text) {
        if let Some(period) = normalize_period(m.as_str()) {
            return Some(period);
        }
    }

    let caps = EMBEDDED_MONTH_NAME.captures(text)?;
    normalize_period(&format!("{} {}", &caps[1], &caps[2]))
}

// chrono reads `%Y` with any digit count; short years are never real periods here.
fn full_year(date: NaiveDate) -> Option<NaiveDate> {
    (date.year() >= 1000).then_some(date)
}

fn parse_calendar_date(text: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return full_year(dt.date_naive());
    }

    let with_day = format!("1 {}", text);
    let month_level = MONTH_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(&with_day, &format!("%d {}", fmt)).ok());
    let datetimes = DATETIME_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date());
    let dates = DATE_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok());

    month_level.chain(datetimes).chain(dates).find_map(full_year)
}

/// Display label for a canonical period, e.g. `"2024-01"` -> `"Jan 2024"`.
pub fn format_period(period: &str) -> String {
    match period_start_date(period) {
        Some(date) => date.format("%b %Y").to_string(),
        None => period.to_string(),
    }
}

pub fn format_period_range(periods: &[String]) -> String {
    let mut sorted: Vec<&String> = periods.iter().collect();
    sorted.sort();

    match (sorted.first(), sorted.last()) {
        (None, _) | (_, None) => String::new(),
        (Some(first), Some(last)) if first == last => format_period(first),
        (Some(first), Some(last)) => format!("{} - {}", format_period(first), format_period(last)),
    }
}
