//! # Field Values
//!
//! A resolved field value, tagged by [`ValueType`]. Values parse from what a
//! user types, display the way a cartel prints them, and compare by type:
//!
//! | Type | Parses | Displays | Equal when |
//! |------|--------|----------|------------|
//! | currency | `1000`, `1000.00`, `$1.000,50` | `$1.000`, `$1.000,50` | same cents |
//! | percentage | `20`, `20%`, `12,5 %` | `20%`, `12,50%` | same hundredths |
//! | date | `2026-10-19`, `19/10/2026` | `19/10/2026` | same day |
//! | text | anything | as is | same after trimming |
//! | code | anything non-empty | as is | identical |
//!
//! A lone `.` followed by exactly three digits is a thousands separator
//! (`1.000` is one thousand), matching how prices are written on the shelf.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fields::ValueType;

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Currency(f64),
    Percentage(f64),
    Date(NaiveDate),
    Code(String),
}

impl FieldValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            FieldValue::Text(_) => ValueType::Text,
            FieldValue::Currency(_) => ValueType::Currency,
            FieldValue::Percentage(_) => ValueType::Percentage,
            FieldValue::Date(_) => ValueType::Date,
            FieldValue::Code(_) => ValueType::Code,
        }
    }

    /// Parse user input for a field of the given type.
    ///
    /// The error is a short reason suitable for an inline message.
    pub fn parse(value_type: ValueType, input: &str) -> Result<Self, String> {
        let trimmed = input.trim();
        match value_type {
            ValueType::Text => Ok(FieldValue::Text(trimmed.to_string())),
            ValueType::Code => {
                if trimmed.is_empty() {
                    Err("code cannot be empty".into())
                } else {
                    Ok(FieldValue::Code(trimmed.to_string()))
                }
            }
            ValueType::Currency => parse_number(trimmed)
                .filter(|n| *n >= 0.0)
                .map(FieldValue::Currency)
                .ok_or_else(|| "expected a non-negative amount".into()),
            ValueType::Percentage => parse_number(trimmed)
                .filter(|n| (0.0..=100.0).contains(n))
                .map(FieldValue::Percentage)
                .ok_or_else(|| "expected a percentage between 0 and 100".into()),
            ValueType::Date => parse_date(trimmed)
                .map(FieldValue::Date)
                .ok_or_else(|| "expected a date like 19/10/2026 or 2026-10-19".into()),
        }
    }

    /// Numeric reading of the value. Text and code values are parsed.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Currency(n) | FieldValue::Percentage(n) => Some(*n),
            FieldValue::Text(s) | FieldValue::Code(s) => parse_number(s.trim()),
            FieldValue::Date(_) => None,
        }
    }

    /// Calendar reading of the value. Text values are parsed.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            FieldValue::Text(s) | FieldValue::Code(s) => parse_date(s.trim()),
            _ => None,
        }
    }

    /// Whether two values are the same for a field of `value_type`.
    ///
    /// Formatting differences never count as a change: `1000` and `1000.00`
    /// are equal currency values.
    pub fn equivalent(value_type: ValueType, a: &FieldValue, b: &FieldValue) -> bool {
        match value_type {
            t if t.is_numeric() => match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => to_hundredths(x) == to_hundredths(y),
                _ => a.to_string() == b.to_string(),
            },
            ValueType::Date => match (a.as_date(), b.as_date()) {
                (Some(x), Some(y)) => x == y,
                _ => a.to_string() == b.to_string(),
            },
            ValueType::Text => a.to_string().trim() == b.to_string().trim(),
            ValueType::Code | ValueType::Currency | ValueType::Percentage => {
                a.to_string() == b.to_string()
            }
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) | FieldValue::Code(s) => f.write_str(s),
            FieldValue::Currency(n) => write!(f, "${}", format_grouped(*n)),
            FieldValue::Percentage(n) => write!(f, "{}%", format_grouped(*n)),
            FieldValue::Date(d) => write!(f, "{}", d.format("%d/%m/%Y")),
        }
    }
}

/// Round half away from zero to two decimals.
pub fn round_cents(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

fn to_hundredths(n: f64) -> i64 {
    (n * 100.0).round() as i64
}

/// `1234567.5` → `1.234.567,50`; whole numbers drop the decimals.
fn format_grouped(n: f64) -> String {
    let cents = to_hundredths(n.abs());
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if n < 0.0 && cents != 0 { "-" } else { "" };
    if frac == 0 {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{},{:02}", sign, grouped, frac)
    }
}

/// Parse `1000`, `1000.5`, `1.000`, `1.000,50`, `$ 1.000`, `20%`.
fn parse_number(input: &str) -> Option<f64> {
    let cleaned: String = input
        .chars()
        .filter(|c| !matches!(c, '$' | '%' | ' ' | '\u{a0}'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = if cleaned.contains(',') {
        // Comma decimals: dots are thousands separators.
        cleaned.replace('.', "").replacen(',', ".", 1)
    } else {
        let dots = cleaned.matches('.').count();
        let thousands = dots > 1
            || (dots == 1
                && cleaned
                    .split_once('.')
                    .is_some_and(|(_, tail)| tail.len() == 3));
        if thousands {
            cleaned.replace('.', "")
        } else {
            cleaned
        }
    };

    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(input, "%d/%m/%Y"))
        .ok()
}
