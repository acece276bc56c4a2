//! ISO-8601 week computation and the default offer validity window.
//!
//! Weeks are Monday-start; week 1 is the week containing the year's first
//! Thursday, so end-of-December dates can belong to week 1 of the following
//! year. chrono's `iso_week()` implements exactly this rule.

use chrono::{DateTime, Datelike, Duration, Utc};

/// Number of days a leaflet offer stays valid when the retailer provides no
/// explicit window: run day plus six more days covers one retail week.
pub const DEFAULT_VALIDITY_DAYS: i64 = 6;

/// An ISO year/week pair with its canonical `YYYY-Www` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoWeekId {
    pub year: i32,
    pub week: u32,
    pub key: String,
}

/// Computes the ISO week identifier for `now`. Pure; no side effects.
#[must_use]
pub fn week_for(now: DateTime<Utc>) -> IsoWeekId {
    let iso = now.iso_week();
    IsoWeekId {
        year: iso.year(),
        week: iso.week(),
        key: format_week_key(iso.year(), iso.week()),
    }
}

/// Formats a week key as `YYYY-Www` with a two-digit zero-padded week.
#[must_use]
pub fn format_week_key(year: i32, week: u32) -> String {
    format!("{year}-W{week:02}")
}

/// Parses a `YYYY-Www` week key back into an [`IsoWeekId`].
///
/// Returns `None` for malformed keys or week numbers outside `1..=53`.
#[must_use]
pub fn parse_week_key(key: &str) -> Option<IsoWeekId> {
    let (year_part, week_part) = key.split_once("-W")?;
    let year: i32 = year_part.parse().ok()?;
    if week_part.len() != 2 {
        return None;
    }
    let week: u32 = week_part.parse().ok()?;
    if !(1..=53).contains(&week) {
        return None;
    }
    Some(IsoWeekId {
        year,
        week,
        key: format_week_key(year, week),
    })
}

/// Default validity window for offers without an explicit one: run time
/// through run time plus [`DEFAULT_VALIDITY_DAYS`].
#[must_use]
pub fn default_validity(run_time: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (run_time, run_time + Duration::days(DEFAULT_VALIDITY_DAYS))
}
