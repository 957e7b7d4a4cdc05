//! Post date recovery
//!
//! Board listings print dates in several shapes depending on age and skin:
//! full timestamps, two-digit years, year-less "month-day time" stamps, or a
//! timestamp buried in surrounding text. Parsing tries strict formats first,
//! then two regex fallbacks; the first success wins.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// How a format expresses the year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum YearForm {
    Four,
    Two,
    Missing,
}

/// Strict formats, tried in order
const FORMATS: [(&str, YearForm); 8] = [
    ("%Y-%m-%d %H:%M:%S", YearForm::Four),
    ("%Y-%m-%d %H:%M", YearForm::Four),
    ("%Y-%m-%d", YearForm::Four),
    ("%y-%m-%d %H:%M:%S", YearForm::Two),
    ("%y-%m-%d %H:%M", YearForm::Two),
    ("%y-%m-%d", YearForm::Two),
    ("%m-%d %H:%M:%S", YearForm::Missing),
    ("%m-%d %H:%M", YearForm::Missing),
];

static FULL_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2,4})[/-](\d{1,2})[/-](\d{1,2})\s+(\d{1,2}):(\d{1,2})(?::(\d{1,2}))?")
        .expect("valid timestamp regex")
});

static MONTH_DAY_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})[/-](\d{1,2})\s+(\d{1,2}):(\d{1,2})(?::(\d{1,2}))?")
        .expect("valid month-day regex")
});

static EMBEDDED_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}[/-]\d{1,2}[/-]\d{1,2}\s+\d{1,2}:\d{1,2}:\d{1,2}")
        .expect("valid embedded timestamp regex")
});

/// Parses the date text of a listing cell
///
/// When the cell contains a complete `YYYY-M-D H:M:S` timestamp among other
/// text, only that timestamp is parsed; otherwise the whole cell is.
pub fn parse_listing_date(text: &str, reference_year: i32) -> Option<NaiveDateTime> {
    match EMBEDDED_TIMESTAMP.find(text) {
        Some(found) => parse_post_date(found.as_str(), reference_year),
        None => parse_post_date(text, reference_year),
    }
}

/// Parses a post date string
///
/// # Arguments
///
/// * `text` - The raw date text; `/` and `-` separators are equivalent
/// * `reference_year` - Year assumed for stamps that omit it
///
/// # Returns
///
/// The parsed timestamp, or `None` when no format or fallback matches
pub fn parse_post_date(text: &str, reference_year: i32) -> Option<NaiveDateTime> {
    let normalized = text.trim().replace('/', "-");
    if normalized.is_empty() {
        return None;
    }

    parse_with_formats(&normalized, reference_year)
        .or_else(|| parse_full_timestamp(&normalized))
        .or_else(|| parse_month_day_time(&normalized, reference_year))
}

/// Returns the year form the leading date token is written in
fn year_form_of(normalized: &str) -> Option<YearForm> {
    let date_part = normalized.split_whitespace().next()?;
    let tokens: Vec<&str> = date_part.split('-').collect();

    if !tokens
        .iter()
        .all(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_digit()))
    {
        return None;
    }

    match (tokens.len(), tokens[0].len()) {
        (3, 4) => Some(YearForm::Four),
        (3, 2) => Some(YearForm::Two),
        (2, _) => Some(YearForm::Missing),
        _ => None,
    }
}

fn parse_with_formats(normalized: &str, reference_year: i32) -> Option<NaiveDateTime> {
    let form = year_form_of(normalized)?;

    FORMATS
        .iter()
        .filter(|(_, year_form)| *year_form == form)
        .find_map(|(fmt, year_form)| match year_form {
            YearForm::Missing => {
                let with_year = format!("{}-{}", reference_year, normalized);
                NaiveDateTime::parse_from_str(&with_year, &format!("%Y-{}", fmt)).ok()
            }
            _ if fmt.contains("%H") => NaiveDateTime::parse_from_str(normalized, fmt).ok(),
            _ => NaiveDate::parse_from_str(normalized, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
        })
}

fn parse_full_timestamp(normalized: &str) -> Option<NaiveDateTime> {
    let caps = FULL_TIMESTAMP.captures(normalized)?;
    let num = |idx: usize| caps.get(idx).and_then(|m| m.as_str().parse::<u32>().ok());

    let mut year = num(1)? as i32;
    if year < 100 {
        year += 2000;
    }

    build_timestamp(year, num(2)?, num(3)?, num(4)?, num(5)?, num(6).unwrap_or(0))
}

fn parse_month_day_time(normalized: &str, reference_year: i32) -> Option<NaiveDateTime> {
    let caps = MONTH_DAY_TIME.captures(normalized)?;
    let num = |idx: usize| caps.get(idx).and_then(|m| m.as_str().parse::<u32>().ok());

    build_timestamp(
        reference_year,
        num(1)?,
        num(2)?,
        num(3)?,
        num(4)?,
        num(5).unwrap_or(0),
    )
}

fn build_timestamp(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}
