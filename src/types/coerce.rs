//! Conversions from raw CSV cells into typed ledger values.
//!
//! Every coercer is total: blank, missing or malformed input yields `None`
//! rather than an error, so a single bad cell never aborts an import.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

static DAY_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2})/(\d{2})/(\d{4})$").expect("day/month/year pattern is valid")
});

const FALLBACK_DATE_FORMATS: [&str; 6] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y", "%b %d, %Y", "%B %d, %Y"];
const FALLBACK_DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Thousands and decimal separator pair used by a vendor export.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DecimalConvention {
    /// `1.234,56`
    Latam,
    /// `1,234.56`
    Us
}

impl DecimalConvention {
    pub fn parse(self, value: Option<&str>) -> Option<Decimal> {
        match self {
            DecimalConvention::Latam => to_decimal_latam(value),
            DecimalConvention::Us => to_decimal_us(value)
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Keeps only the digits, re-applying a minus sign when the cell starts with one.
fn integer_literal(value: &str) -> Option<String> {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();

    if digits.is_empty() {
        return None;
    }

    if value.starts_with('-') {
        Some(format!("-{digits}"))
    } else {
        Some(digits)
    }
}

pub fn to_int(value: Option<&str>) -> Option<i32> {
    integer_literal(non_blank(value)?)?.parse().ok()
}

/// Document numbers routinely exceed the 32-bit range, so they get a wider target.
/// Values outside the `i64` range (the `BIGINT` column) come back as `None`.
pub fn to_big_int(value: Option<&str>) -> Option<i64> {
    integer_literal(non_blank(value)?)?.parse().ok()
}

pub fn to_decimal_latam(value: Option<&str>) -> Option<Decimal> {
    let normalized = non_blank(value)?.replace('.', "").replace(',', ".");
    leading_decimal(&normalized)
}

pub fn to_decimal_us(value: Option<&str>) -> Option<Decimal> {
    let normalized = non_blank(value)?.replace(',', "");
    leading_decimal(&normalized)
}

/// Reads the longest numeric prefix (`[+-]digits[.digits]`), ignoring any trailing text.
fn leading_decimal(text: &str) -> Option<Decimal> {
    let (sign, rest) = match text.as_bytes().first() {
        Some(b'-') => ("-", &text[1..]),
        Some(b'+') => ("", &text[1..]),
        _ => ("", text)
    };

    let integer_length = rest.bytes().take_while(u8::is_ascii_digit).count();
    let integer = &rest[..integer_length];

    let fraction = match rest[integer_length..].strip_prefix('.') {
        Some(tail) => &tail[..tail.bytes().take_while(u8::is_ascii_digit).count()],
        None => ""
    };

    if integer.is_empty() && fraction.is_empty() {
        return None;
    }

    let integer = if integer.is_empty() { "0" } else { integer };
    let literal = if fraction.is_empty() {
        format!("{sign}{integer}")
    } else {
        format!("{sign}{integer}.{fraction}")
    };

    Decimal::from_str(&literal).ok()
}

/// Parses `DD/MM/YYYY` literally before trying the looser formats, since ERP
/// exports mix day-first and month-first orderings.
pub fn to_date(value: Option<&str>) -> Option<NaiveDate> {
    let value = non_blank(value)?;

    if let Some(captures) = DAY_MONTH_YEAR.captures(value) {
        let day = captures[1].parse().ok();
        let month = captures[2].parse().ok();
        let year = captures[3].parse().ok();

        if let (Some(day), Some(month), Some(year)) = (day, month, year) {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(date);
            }
        }
    }

    parse_date_loosely(value)
}

fn parse_date_loosely(value: &str) -> Option<NaiveDate> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.date_naive());
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc2822(value) {
        return Some(timestamp.date_naive());
    }

    FALLBACK_DATE_TIME_FORMATS.iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|timestamp| timestamp.date())
        .or_else(|| {
            FALLBACK_DATE_FORMATS.iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        })
}
