//! Core type definitions for sheetdb.

use chrono::{NaiveDate, NaiveDateTime};
use sheetdb_codec::{serial_to_datetime, CellValue};
use std::fmt;

/// Text layouts accepted when a string cell is read as a date/time.
const DATETIME_TEXT_LAYOUTS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];
const DATE_TEXT_LAYOUTS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Largest float that converts to `i64` without saturating.
#[allow(clippy::cast_precision_loss)]
const I64_FLOAT_BOUND: f64 = i64::MAX as f64;

/// Declared type of a mapped property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// `bool`.
    Bool,
    /// Signed or unsigned integers.
    Int,
    /// Floating point numbers.
    Float,
    /// Strings.
    Text,
    /// Date and time.
    DateTime,
}

impl ValueType {
    /// Converts a raw cell value to this type.
    ///
    /// [`CellValue::Empty`] always passes through unchanged; the caller
    /// decides whether empty means `None` or the type's default. Otherwise
    /// the result is the variant matching `self`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError`] when the value has no meaningful
    /// representation in this type (e.g. `"abc"` as an integer).
    pub fn coerce(self, value: &CellValue) -> Result<CellValue, ConvertError> {
        if value.is_empty() {
            return Ok(CellValue::Empty);
        }
        let converted = match self {
            ValueType::Bool => to_bool(value).map(CellValue::Bool),
            ValueType::Int => to_int(value),
            ValueType::Float => to_float(value),
            ValueType::Text => Some(to_text(value)),
            ValueType::DateTime => to_datetime(value),
        };
        converted.ok_or_else(|| ConvertError::new(self, value))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Text => "text",
            ValueType::DateTime => "datetime",
        };
        f.write_str(name)
    }
}

/// A value that could not be converted to a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertError {
    /// The declared type.
    pub expected: ValueType,
    /// Description of the offending value.
    pub found: String,
}

impl ConvertError {
    /// Creates a conversion error for `value`.
    pub fn new(expected: ValueType, value: &CellValue) -> Self {
        Self {
            expected,
            found: format!("{} {:?}", value.type_name(), value.to_string()),
        }
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot convert {} to {}", self.found, self.expected)
    }
}

impl std::error::Error for ConvertError {}

fn to_bool(value: &CellValue) -> Option<bool> {
    match value {
        CellValue::Bool(b) => Some(*b),
        CellValue::Int(i) => Some(*i != 0),
        CellValue::Float(f) => Some(*f != 0.0),
        CellValue::Text(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("true") || s == "1" {
                Some(true)
            } else if s.eq_ignore_ascii_case("false") || s == "0" {
                Some(false)
            } else {
                None
            }
        }
        CellValue::DateTime(_) | CellValue::Empty => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn float_to_int(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < I64_FLOAT_BOUND {
        Some(f as i64)
    } else {
        None
    }
}

fn to_int(value: &CellValue) -> Option<CellValue> {
    let int = match value {
        CellValue::Int(i) => Some(*i),
        CellValue::Float(f) => float_to_int(*f),
        CellValue::Bool(b) => Some(i64::from(*b)),
        CellValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Some(CellValue::Empty);
            }
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_int))
        }
        CellValue::DateTime(_) | CellValue::Empty => None,
    };
    int.map(CellValue::Int)
}

fn to_float(value: &CellValue) -> Option<CellValue> {
    let float = match value {
        CellValue::Float(f) => Some(*f),
        #[allow(clippy::cast_precision_loss)]
        CellValue::Int(i) => Some(*i as f64),
        CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        CellValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Some(CellValue::Empty);
            }
            s.parse::<f64>().ok()
        }
        CellValue::DateTime(_) | CellValue::Empty => None,
    };
    float.map(CellValue::Float)
}

fn to_text(value: &CellValue) -> CellValue {
    match value {
        CellValue::Text(s) => CellValue::Text(s.clone()),
        other => CellValue::Text(other.to_string()),
    }
}

fn to_datetime(value: &CellValue) -> Option<CellValue> {
    let dt = match value {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::Float(serial) => serial_to_datetime(*serial),
        #[allow(clippy::cast_precision_loss)]
        CellValue::Int(serial) => serial_to_datetime(*serial as f64),
        CellValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Some(CellValue::Empty);
            }
            parse_datetime_text(s)
        }
        CellValue::Bool(_) | CellValue::Empty => None,
    };
    dt.map(CellValue::DateTime)
}

/// Parses the textual date/time layouts sheetdb accepts.
pub(crate) fn parse_datetime_text(s: &str) -> Option<NaiveDateTime> {
    DATETIME_TEXT_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
        .or_else(|| {
            DATE_TEXT_LAYOUTS
                .iter()
                .find_map(|layout| NaiveDate::parse_from_str(s, layout).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
