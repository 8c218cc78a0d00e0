//! Reporting period derived from the survey's file name.
//!
//! Published surveys encode their period in the file name, e.g.
//! `precios-del-05-al-11-de-marzo-2018.pdf`. Storage keys may arrive
//! percent-encoded twice, so the text is decoded two times before scanning.

use std::borrow::Cow;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::error::ConvertError;

pub(crate) const DEFAULT_YEAR: i32 = 2017;

const MONTHS: [(&str, u32); 13] = [
    ("enero", 1),
    ("febrero", 2),
    ("marzo", 3),
    ("abril", 4),
    ("mayo", 5),
    ("junio", 6),
    ("julio", 7),
    ("agosto", 8),
    ("septiembre", 9),
    ("setiembre", 9),
    ("octubre", 10),
    ("noviembre", 11),
    ("diciembre", 12),
];

static MONTHS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(enero|febrero|marzo|abril|mayo|junio|julio|agosto|septiembre|setiembre|octubre|noviembre|diciembre)",
    )
    .expect("hardcoded month regex is valid")
});

static DAYS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9]([0-9]{2})[^0-9]").expect("hardcoded day regex is valid"));

static YEARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{4}").expect("hardcoded year regex is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Resolves a Spanish month name to its number (1-12).
#[must_use]
pub fn month_number(name: &str) -> Option<u32> {
    let lowered = name.trim().to_lowercase();
    MONTHS
        .iter()
        .find(|(month, _)| *month == lowered)
        .map(|(_, number)| *number)
}

fn percent_decode(text: &str) -> Cow<'_, str> {
    urlencoding::decode(text).unwrap_or(Cow::Borrowed(text))
}

fn basename(text: &str) -> &str {
    text.rsplit(['/', '\\']).next().unwrap_or(text)
}

fn months(text: &str) -> Vec<u32> {
    MONTHS_RE
        .find_iter(text)
        .filter_map(|found| month_number(found.as_str()))
        .collect()
}

fn days(text: &str) -> Vec<u32> {
    let stem = text.split('.').next().unwrap_or(text);
    DAYS_RE
        .captures_iter(stem)
        .filter_map(|capture| capture.get(1))
        .filter_map(|digits| digits.as_str().parse().ok())
        .collect()
}

fn years(text: &str) -> Vec<i32> {
    YEARS_RE
        .find_iter(text)
        .filter_map(|found| found.as_str().parse().ok())
        .collect()
}

fn calendar_date(year: i32, month: u32, day: u32) -> Result<NaiveDate, ConvertError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(ConvertError::MalformedDate { year, month, day })
}

/// Extracts the `[start, end]` period from a file name or storage key.
///
/// Missing tokens fall back to January 1st, 2017 for the start date and to
/// the start date's components for the end date. Tokens that cannot form a
/// calendar date (day 32, day 30 of February) are an error.
pub fn date_range_from_text(text: &str) -> Result<DateRange, ConvertError> {
    let once = percent_decode(text);
    let twice = percent_decode(&once);
    let file_name = basename(&twice);

    let months = months(file_name);
    let days = days(file_name);
    let years = years(file_name);

    let start = calendar_date(
        years.first().copied().unwrap_or(DEFAULT_YEAR),
        months.first().copied().unwrap_or(1),
        days.first().copied().unwrap_or(1),
    )?;

    let end = calendar_date(
        years.get(1).copied().unwrap_or(start.year()),
        months.get(1).copied().unwrap_or(start.month()),
        days.get(1).copied().unwrap_or(start.day()),
    )?;

    Ok(DateRange { start, end })
}
