//! Deadline extraction from free text.
//!
//! Patterns are tried in order; the first one that both matches and yields
//! a valid date wins. Anything unparseable is treated as "no deadline".

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::Regex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeadlineShape {
    /// `12/25/2026`, `3-1-26`
    NumericDate,
    /// `March 15th`, `dec 3`
    MonthDay,
    /// `3:30 pm`
    ClockTime,
}

static DEADLINE_PATTERNS: LazyLock<Vec<(DeadlineShape, Regex)>> = LazyLock::new(|| {
    // static literal patterns, compilation cannot fail
    #[allow(clippy::expect_used)]
    let compile = |p: &str| Regex::new(p).expect("deadline regex");
    vec![
        (
            DeadlineShape::NumericDate,
            compile(r"(?i)deadline:?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})"),
        ),
        (
            DeadlineShape::NumericDate,
            compile(r"(?i)due:?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})"),
        ),
        (
            DeadlineShape::MonthDay,
            compile(r"(?i)by\s+(\w+\s+\d{1,2}(?:st|nd|rd|th)?)"),
        ),
        (
            DeadlineShape::ClockTime,
            compile(r"(?i)before\s+(\d{1,2}:\d{2}\s*[ap]m)"),
        ),
    ]
});

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Find the first parseable deadline in `text`.
///
/// Dates without a year use `now`'s year; bare clock times use `now`'s date.
pub fn extract_deadline(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    for (shape, regex) in DEADLINE_PATTERNS.iter() {
        let Some(candidate) = regex.captures(text).and_then(|c| c.get(1)) else {
            continue;
        };
        let parsed = match shape {
            DeadlineShape::NumericDate => parse_numeric_date(candidate.as_str()),
            DeadlineShape::MonthDay => parse_month_day(candidate.as_str(), now.year()),
            DeadlineShape::ClockTime => parse_clock_time(candidate.as_str(), now),
        };
        match parsed {
            Some(deadline) => {
                debug!(raw = candidate.as_str(), %deadline, "Deadline extracted");
                return Some(deadline);
            }
            None => {
                debug!(raw = candidate.as_str(), "Deadline candidate did not parse");
            }
        }
    }
    None
}

fn midnight_utc(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt))
}

/// Month-first numeric date, falling back to day-first when the month
/// slot cannot be a month. Two-digit years are 20yy.
fn parse_numeric_date(raw: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = raw.split(['/', '-']).collect();
    let [first, second, year] = parts.as_slice() else {
        return None;
    };
    let first: u32 = first.parse().ok()?;
    let second: u32 = second.parse().ok()?;
    let year: i32 = match year.len() {
        2 => 2000 + year.parse::<i32>().ok()?,
        4 => year.parse().ok()?,
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year, first, second)
        .or_else(|| NaiveDate::from_ymd_opt(year, second, first))
        .and_then(midnight_utc)
}

fn parse_month_day(raw: &str, year: i32) -> Option<DateTime<Utc>> {
    let mut words = raw.split_whitespace();
    let month_word = words.next()?.to_lowercase();
    let day_word = words.next()?;

    let month = MONTHS
        .iter()
        .position(|m| {
            *m == month_word || (month_word.len() >= 3 && m.starts_with(month_word.as_str()))
        })
        .map(|i| i as u32 + 1)?;

    let day: u32 = day_word
        .trim_end_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .ok()?;

    NaiveDate::from_ymd_opt(year, month, day).and_then(midnight_utc)
}

fn parse_clock_time(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let lower = raw.to_lowercase();
    let (clock, meridiem) = lower.split_at(lower.len().checked_sub(2)?);
    let (hour, minute) = clock.trim().split_once(':')?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    if !(1..=12).contains(&hour) {
        return None;
    }
    let hour = match (meridiem, hour) {
        ("am", 12) => 0,
        ("am", h) => h,
        ("pm", 12) => 12,
        ("pm", h) => h + 12,
        _ => return None,
    };
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    Some(Utc.from_utc_datetime(&now.date_naive().and_time(time)))
}
