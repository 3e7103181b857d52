//! Registry date decoding.
//!
//! Tumor registry exports store dates as eight-digit numbers (`YYYYMMDD`).
//! Stage tables written by this pipeline use ISO 8601 extended dates
//! (`YYYY-MM-DD`). Both decode to the same calendar date, so decoding an
//! already-normalized value is a no-op.
//!
//! Registries carry known data-entry noise (`20150231`, `00000000`,
//! `2015061`), so anything that is not a real calendar date decodes to
//! `None` instead of failing.

use chrono::{Datelike, NaiveDate};

/// A value that may be decoded into a calendar date.
pub trait CalendarDate {
    fn to_calendar_date(&self) -> Option<NaiveDate>;
}

impl CalendarDate for NaiveDate {
    fn to_calendar_date(&self) -> Option<NaiveDate> {
        Some(*self)
    }
}

impl CalendarDate for str {
    fn to_calendar_date(&self) -> Option<NaiveDate> {
        parse_registry_date(self)
    }
}

impl CalendarDate for String {
    fn to_calendar_date(&self) -> Option<NaiveDate> {
        parse_registry_date(self)
    }
}

impl<T: CalendarDate> CalendarDate for Option<T> {
    fn to_calendar_date(&self) -> Option<NaiveDate> {
        self.as_ref().and_then(CalendarDate::to_calendar_date)
    }
}

fn all_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Decode a registry date.
///
/// Accepted encodings:
/// - `YYYYMMDD`, optionally with a spreadsheet float suffix (`20150601.0`)
/// - `YYYY-MM-DD`, optionally followed by a time part (`2015-06-01 00:00:00`)
pub fn parse_registry_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let basic = match trimmed.split_once('.') {
        Some((int, frac)) if !frac.is_empty() && frac.bytes().all(|b| b == b'0') => int,
        _ => trimmed,
    };
    if basic.len() == 8 && all_digits(basic) {
        return ymd(&basic[0..4], &basic[4..6], &basic[6..8]);
    }

    let date_part = match trimmed.find(['T', ' ']) {
        Some(pos) => &trimmed[..pos],
        None => trimmed,
    };
    let mut parts = date_part.split('-');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(year), Some(month), Some(day), None)
            if year.len() == 4
                && month.len() == 2
                && day.len() == 2
                && all_digits(year)
                && all_digits(month)
                && all_digits(day) =>
        {
            ymd(year, month, day)
        }
        _ => None,
    }
}

/// ISO 8601 extended date, the encoding used by stage tables.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Registry `YYYYMMDD` encoding.
pub fn encode_date(date: NaiveDate) -> String {
    format!("{:04}{:02}{:02}", date.year(), date.month(), date.day())
}
