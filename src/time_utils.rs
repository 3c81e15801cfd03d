// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time parsing and formatting.
//!
//! Polar reports durations in ISO-8601 syntax (`PT1H30M`). They are stored
//! in the `H:MM:SS` clock form that earlier releases wrote to the fallback
//! cache, so old cache files stay valid.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};

const MICROS_PER_SECOND: i64 = 1_000_000;
const SECONDS_PER_DAY: i64 = 86_400;

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Errors from ISO-8601 duration parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    #[error("invalid ISO-8601 duration: {0:?}")]
    Invalid(String),

    #[error("duration {0:?} uses year or month components, which have no fixed length")]
    CalendarUnit(String),

    #[error("duration {0:?} is out of range")]
    Overflow(String),
}

/// Parse an ISO-8601 duration such as `PT1H30M` or `P1DT2.5S`.
pub fn parse_iso8601_duration(raw: &str) -> Result<Duration, DurationError> {
    let invalid = || DurationError::Invalid(raw.to_string());

    let rest = raw.trim().strip_prefix('P').ok_or_else(invalid)?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) if !time.is_empty() => (date, Some(time)),
        Some(_) => return Err(invalid()),
        None => (rest, None),
    };
    if date_part.is_empty() && time_part.is_none() {
        return Err(invalid());
    }

    let mut micros: i64 = 0;

    for (number, unit) in components(date_part).ok_or_else(invalid)? {
        let unit_seconds = match unit {
            'W' => 7 * SECONDS_PER_DAY,
            'D' => SECONDS_PER_DAY,
            'Y' | 'M' => return Err(DurationError::CalendarUnit(raw.to_string())),
            _ => return Err(invalid()),
        };
        micros = add_component(micros, number, unit_seconds, raw)?;
    }

    if let Some(time_part) = time_part {
        for (number, unit) in components(time_part).ok_or_else(invalid)? {
            let unit_seconds = match unit {
                'H' => 3_600,
                'M' => 60,
                'S' => 1,
                _ => return Err(invalid()),
            };
            micros = add_component(micros, number, unit_seconds, raw)?;
        }
    }

    Ok(Duration::microseconds(micros))
}

/// Render a duration in clock form: `1:30:00`, `2 days, 0:05:00`, `0:00:45.500000`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration
        .num_microseconds()
        .unwrap_or_else(|| duration.num_seconds().saturating_mul(MICROS_PER_SECOND));

    let days = total / (SECONDS_PER_DAY * MICROS_PER_SECOND);
    let rem = total % (SECONDS_PER_DAY * MICROS_PER_SECOND);
    let seconds = rem / MICROS_PER_SECOND;
    let fraction = rem % MICROS_PER_SECOND;

    let clock = if fraction > 0 {
        format!(
            "{}:{:02}:{:02}.{:06}",
            seconds / 3_600,
            (seconds / 60) % 60,
            seconds % 60,
            fraction
        )
    } else {
        format!(
            "{}:{:02}:{:02}",
            seconds / 3_600,
            (seconds / 60) % 60,
            seconds % 60
        )
    };

    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        n => format!("{} days, {}", n, clock),
    }
}

/// Parse an ISO-8601 duration and return it in clock form.
pub fn normalize_duration(raw: &str) -> Result<String, DurationError> {
    parse_iso8601_duration(raw).map(format_duration)
}

/// Parse a Polar date (`2024-01-01`) or local timestamp (`2024-01-01T07:30:00`).
///
/// Dates sort as midnight of that day.
pub fn parse_polar_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    if raw.len() == 10 {
        return NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
}

/// Split `1H30M` into `[("1", 'H'), ("30", 'M')]`.
fn components(part: &str) -> Option<Vec<(&str, char)>> {
    let mut out = Vec::new();
    let mut start = 0;

    for (idx, ch) in part.char_indices() {
        if ch.is_ascii_digit() || ch == '.' || ch == ',' {
            continue;
        }
        let number = &part[start..idx];
        if number.is_empty() {
            return None;
        }
        out.push((number, ch));
        start = idx + ch.len_utf8();
    }

    // Trailing digits without a unit designator
    if start != part.len() {
        return None;
    }
    Some(out)
}

/// Add `number` units of `unit_seconds` to an accumulated microsecond total.
fn add_component(
    acc: i64,
    number: &str,
    unit_seconds: i64,
    raw: &str,
) -> Result<i64, DurationError> {
    let overflow = || DurationError::Overflow(raw.to_string());
    let invalid = || DurationError::Invalid(raw.to_string());

    let (whole, fraction) = match number.find(['.', ',']) {
        Some(pos) => (&number[..pos], &number[pos + 1..]),
        None => (number, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };

    // Fraction of one unit, in millionths
    let millionths: i64 = if fraction.is_empty() {
        0
    } else {
        let digits: String = fraction.chars().chain(std::iter::repeat('0')).take(6).collect();
        digits.parse().map_err(|_| invalid())?
    };

    let whole_micros = whole
        .checked_mul(unit_seconds)
        .and_then(|s| s.checked_mul(MICROS_PER_SECOND))
        .ok_or_else(overflow)?;
    let fraction_micros = millionths.checked_mul(unit_seconds).ok_or_else(overflow)?;

    acc.checked_add(whole_micros)
        .and_then(|v| v.checked_add(fraction_micros))
        .ok_or_else(overflow)
}
