// crates/gatekit-core/src/time_parse.rs
// ============================================================================
// Module: Gatekit Temporal Parsing
// Description: Epoch-unit autodetection and RFC3339 parsing for the
// `before`/`after`/`on` condition operators.
// Purpose: Faithfully reproduce the source SDK's "guess seconds vs
// milliseconds" heuristic and date-only fallback.
// Dependencies: time
// ============================================================================

//! ## Overview
//! `before`/`after`/`on` compare either two numeric epoch values (seconds or
//! milliseconds, autodetected) or two RFC3339 strings (date-time, or bare
//! `YYYY-MM-DD`). Per §9's open-questions note, the seconds/milliseconds
//! split is a heuristic carried over from the source SDK, not a formally
//! documented contract: a value is treated as milliseconds when interpreting
//! it as seconds would land more than 100 years in the future.

use std::cmp::Ordering;

use time::Date;
use time::Month;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Seconds-per-year approximation used for the epoch-unit heuristic. Not
/// exact (ignores leap years) but matches the source SDK's own heuristic,
/// which is not a formally documented contract either (§9).
const APPROX_SECONDS_PER_YEAR: i64 = 365 * 24 * 60 * 60;

/// Number of "future years" beyond which a raw epoch value is assumed to be
/// milliseconds rather than seconds.
const FUTURE_YEAR_THRESHOLD: i64 = 100;

/// Normalizes a raw epoch integer (seconds or milliseconds) to milliseconds,
/// autodetecting the unit with the "year > now + 100" heuristic.
#[must_use]
pub fn normalize_epoch_to_millis(raw: i64, now_unix_seconds: i64) -> i64 {
    let future_bound = now_unix_seconds + FUTURE_YEAR_THRESHOLD * APPROX_SECONDS_PER_YEAR;
    if raw > future_bound {
        raw
    } else {
        raw.saturating_mul(1000)
    }
}

/// Parses an RFC3339 date-time string, or a bare `YYYY-MM-DD` date, into a
/// comparable `OffsetDateTime`. Returns `None` for anything else.
#[must_use]
pub fn parse_temporal(value: &str) -> Option<OffsetDateTime> {
    if let Ok(parsed) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(parsed);
    }
    parse_date_only(value).and_then(|date| date.midnight().assume_utc().into())
}

/// Parses a bare `YYYY-MM-DD` date with no time component.
fn parse_date_only(value: &str) -> Option<Date> {
    let mut parts = value.split('-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u8 = parts.next()?.parse().ok()?;
    let day: u8 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

/// Orders two temporal strings, trying RFC3339/date parsing on each.
#[must_use]
pub fn compare_temporal(left: &str, right: &str) -> Option<Ordering> {
    let left = parse_temporal(left)?;
    let right = parse_temporal(right)?;
    Some(left.cmp(&right))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_seconds_when_plausible() {
        let now = 1_700_000_000;
        assert_eq!(normalize_epoch_to_millis(now, now), now * 1000);
    }

    #[test]
    fn detects_milliseconds_when_far_future_as_seconds() {
        let now = 1_700_000_000;
        let millis = now * 1000;
        assert_eq!(normalize_epoch_to_millis(millis, now), millis);
    }

    #[test]
    fn parses_date_only_strings() {
        let left = parse_temporal("2024-01-01").expect("parse");
        let right = parse_temporal("2024-06-01").expect("parse");
        assert!(left < right);
    }

    #[test]
    fn parses_rfc3339_datetime() {
        let value = parse_temporal("2024-01-01T00:00:00Z");
        assert!(value.is_some());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_temporal("not-a-date").is_none());
    }
}
