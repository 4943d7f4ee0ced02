//! Best-effort resolution of a verbatim deadline token to a calendar date.
//!
//! Extraction keeps the deadline as typed. Systems of record such as an escrow
//! contract want a timestamp, so this module resolves the common shapes and
//! gives up (returns `None`) on anything else.

use chrono::{Datelike, NaiveDate};

/// Numeric layouts tried in order. Slash dates are read month-first, with
/// day-first as a fallback when the month would be out of range.
const NUMERIC_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y", "%m-%d-%Y"];

const LEAP_YEAR_GAP: i32 = 8;

/// Resolve a deadline token to a date.
///
/// `Month Day` tokens carry no year: they resolve to the next occurrence on or
/// after `today`. A leap day resolves to the next leap year.
pub fn resolve_deadline(deadline: &str, today: NaiveDate) -> Option<NaiveDate> {
    let raw = deadline.trim();
    if raw.is_empty() {
        return None;
    }

    for fmt in NUMERIC_FORMATS.iter() {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }

    // Leap years can be up to eight years apart (2096 -> 2104)
    (today.year()..=today.year() + LEAP_YEAR_GAP)
        .filter_map(|year| NaiveDate::parse_from_str(&format!("{} {}", raw, year), "%B %d %Y").ok())
        .find(|date| *date >= today)
}

/// Unix timestamp (seconds) of UTC midnight on the resolved deadline.
pub fn deadline_timestamp(deadline: &str, today: NaiveDate) -> Option<i64> {
    resolve_deadline(deadline, today)?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
}
