//! Locale-aware date parsing for captured date strings.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use super::Language;

lazy_static! {
    /// Year-first numeric form: 2025.05.05, 2025-05-05, 2025/05/05.
    static ref DATE_YMD: Regex =
        Regex::new(r"\b(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})\b").unwrap();

    /// Day-first numeric form: 05.05.2025, 05-05-25.
    static ref DATE_DMY: Regex =
        Regex::new(r"\b(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})\b").unwrap();

    /// Hungarian long form: "2025. május 5."
    static ref DATE_HU_LONG: Regex = Regex::new(
        r"(?i)(\d{4})\.?\s*(január|február|március|április|május|június|július|augusztus|szeptember|október|november|december)\s+(\d{1,2})\.?"
    ).unwrap();

    /// English long form: "May 5, 2025" or "5 May 2025".
    static ref DATE_EN_LONG: Regex = Regex::new(
        r"(?i)(?:(january|february|march|april|may|june|july|august|september|october|november|december)\s+(\d{1,2}),?\s+(\d{4})|(\d{1,2})\s+(january|february|march|april|may|june|july|august|september|october|november|december),?\s+(\d{4}))"
    ).unwrap();
}

/// Parse a captured date string.
///
/// Year-first is preferred when the first group is 4 digits, so
/// `2025.05.05` and `05.05.2025` resolve to the same calendar date.
/// Returns `None` (not an error) when no supported form matches.
pub fn parse_date(raw: &str, language: Language) -> Option<NaiveDate> {
    if let Some(caps) = DATE_YMD.captures(raw) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    if let Some(caps) = DATE_DMY.captures(raw) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year = expand_year(caps[3].parse().ok()?);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    match language {
        Language::Hungarian => parse_hungarian_long(raw),
        Language::English => parse_english_long(raw),
    }
}

fn parse_hungarian_long(raw: &str) -> Option<NaiveDate> {
    let caps = DATE_HU_LONG.captures(raw)?;
    let year: i32 = caps[1].parse().ok()?;
    let month = hungarian_month_to_number(&caps[2])?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_english_long(raw: &str) -> Option<NaiveDate> {
    let caps = DATE_EN_LONG.captures(raw)?;
    let (month_name, day_str, year_str) = if caps.get(1).is_some() {
        (&caps[1], &caps[2], &caps[3])
    } else {
        (&caps[5], &caps[4], &caps[6])
    };
    let month = english_month_to_number(month_name)?;
    let day: u32 = day_str.parse().ok()?;
    let year: i32 = year_str.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn expand_year(year: i32) -> i32 {
    if year < 100 {
        // Two-digit year: 2000s for 00-50, 1900s for 51-99.
        if year <= 50 {
            2000 + year
        } else {
            1900 + year
        }
    } else {
        year
    }
}

fn hungarian_month_to_number(month: &str) -> Option<u32> {
    match month.to_lowercase().as_str() {
        "január" => Some(1),
        "február" => Some(2),
        "március" => Some(3),
        "április" => Some(4),
        "május" => Some(5),
        "június" => Some(6),
        "július" => Some(7),
        "augusztus" => Some(8),
        "szeptember" => Some(9),
        "október" => Some(10),
        "november" => Some(11),
        "december" => Some(12),
        _ => None,
    }
}

fn english_month_to_number(month: &str) -> Option<u32> {
    match month.to_lowercase().as_str() {
        "january" => Some(1),
        "february" => Some(2),
        "march" => Some(3),
        "april" => Some(4),
        "may" => Some(5),
        "june" => Some(6),
        "july" => Some(7),
        "august" => Some(8),
        "september" => Some(9),
        "october" => Some(10),
        "november" => Some(11),
        "december" => Some(12),
        _ => None,
    }
}
