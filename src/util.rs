// Utility helpers for parsing and basic statistics.
//
// This module centralizes all the "dirty" cell/number/date handling so the
// rest of the code can assume clean, typed values.
use crate::workbook::Cell;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports (commas, spaces, text).
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters, other than an
///   exponent marker (`1.5E+05`).
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let is_exponent = |c: char| matches!(c, 'e' | 'E');
    let mut parts = s.split(is_exponent);
    let mantissa = parts.next().unwrap_or_default();
    let has_stray_letter = s.chars().any(|c| c.is_ascii_alphabetic() && !is_exponent(c));
    if mantissa.is_empty() || has_stray_letter || parts.count() > 1 {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok()
}

/// Numeric value of a cell, if it has one. Booleans count as 1/0.
pub fn cell_f64(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(s) => parse_f64_safe(s),
        Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Integer identifier stored in a cell; `12.0` and `"12"` both yield `12`.
pub fn cell_i64(cell: &Cell) -> Option<i64> {
    let n = match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => {
            let s = s.trim();
            if let Ok(v) = s.parse::<i64>() {
                return Some(v);
            }
            parse_f64_safe(s)?
        }
        _ => return None,
    };
    if n.is_finite() && n.fract() == 0.0 {
        Some(n as i64)
    } else {
        None
    }
}

/// Non-blank text content of a cell. Integral numbers render without a
/// trailing `.0` so numeric license plates survive.
pub fn cell_text(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Text(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Cell::Number(n) if n.fract() == 0.0 => Some(format!("{}", *n as i64)),
        Cell::Number(n) => Some(n.to_string()),
        Cell::Bool(b) => Some(b.to_string()),
        Cell::DateTime(dt) => Some(dt.to_string()),
        Cell::Empty => None,
    }
}

/// Whether a cell carries no value at all (empty, or whitespace-only text).
pub fn is_blank(cell: &Cell) -> bool {
    match cell {
        Cell::Empty => true,
        Cell::Text(s) => s.trim().is_empty(),
        _ => false,
    }
}

const DATETIME_FORMATS: [&str; 9] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];

/// Timestamp held by a cell. Offsets are converted to UTC and dropped, so
/// every result is a naive UTC-or-local wall clock time.
pub fn cell_datetime(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::DateTime(dt) => Some(*dt),
        Cell::Number(serial) => excel_serial_to_datetime(*serial),
        Cell::Text(s) => parse_datetime_safe(s),
        _ => None,
    }
}

pub fn parse_datetime_safe(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt);
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Spreadsheet serial date (days since 1899-12-30, fraction = time of day).
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

pub fn average(v: &[f64]) -> f64 {
    // Standard arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// `numerator / denominator`, or 0 when the denominator is zero.
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

pub fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // Use `num-format` to insert commas into the integer portion.
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    // Only sign values that are still non-zero after rounding.
    if n.is_sign_negative() && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for integer-like values. This is used
    // for counts in console messages (e.g., `9,855 trips loaded`).
    n.to_formatted_string(&Locale::en)
}
