//! Typed property values.

use crate::types::{ConvertError, ValueType};
use chrono::NaiveDateTime;
use sheetdb_codec::CellValue;

/// A Rust type that can back a mapped property.
///
/// `from_cell` receives a value already coerced to [`Self::VALUE_TYPE`]
/// (see [`ValueType::coerce`]) or [`CellValue::Empty`]. Non-nullable types
/// map empty to their `Default`; `Option<T>` maps it to `None`.
pub trait FieldValue: Default + Send + Sync + 'static {
    /// Declared type of the column.
    const VALUE_TYPE: ValueType;
    /// Whether an empty cell maps to an explicit absence.
    const NULLABLE: bool = false;

    /// Converts the property value to a cell.
    fn to_cell(&self) -> CellValue;

    /// Converts a coerced cell back to the property value.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError`] if the value does not fit (e.g. an integer
    /// outside the `i32` range).
    fn from_cell(value: CellValue) -> Result<Self, ConvertError>;
}

fn mismatch<T>(expected: ValueType, value: &CellValue) -> Result<T, ConvertError> {
    Err(ConvertError::new(expected, value))
}

impl FieldValue for bool {
    const VALUE_TYPE: ValueType = ValueType::Bool;

    fn to_cell(&self) -> CellValue {
        CellValue::Bool(*self)
    }

    fn from_cell(value: CellValue) -> Result<Self, ConvertError> {
        match value {
            CellValue::Bool(b) => Ok(b),
            CellValue::Empty => Ok(false),
            other => mismatch(Self::VALUE_TYPE, &other),
        }
    }
}

impl FieldValue for i64 {
    const VALUE_TYPE: ValueType = ValueType::Int;

    fn to_cell(&self) -> CellValue {
        CellValue::Int(*self)
    }

    fn from_cell(value: CellValue) -> Result<Self, ConvertError> {
        match value {
            CellValue::Int(i) => Ok(i),
            CellValue::Empty => Ok(0),
            other => mismatch(Self::VALUE_TYPE, &other),
        }
    }
}

impl FieldValue for i32 {
    const VALUE_TYPE: ValueType = ValueType::Int;

    fn to_cell(&self) -> CellValue {
        CellValue::Int(i64::from(*self))
    }

    fn from_cell(value: CellValue) -> Result<Self, ConvertError> {
        match value {
            CellValue::Int(i) => i32::try_from(i).or_else(|_| mismatch(Self::VALUE_TYPE, &value)),
            CellValue::Empty => Ok(0),
            other => mismatch(Self::VALUE_TYPE, &other),
        }
    }
}

impl FieldValue for u32 {
    const VALUE_TYPE: ValueType = ValueType::Int;

    fn to_cell(&self) -> CellValue {
        CellValue::Int(i64::from(*self))
    }

    fn from_cell(value: CellValue) -> Result<Self, ConvertError> {
        match value {
            CellValue::Int(i) => u32::try_from(i).or_else(|_| mismatch(Self::VALUE_TYPE, &value)),
            CellValue::Empty => Ok(0),
            other => mismatch(Self::VALUE_TYPE, &other),
        }
    }
}

impl FieldValue for u64 {
    const VALUE_TYPE: ValueType = ValueType::Int;

    #[allow(clippy::cast_precision_loss)]
    fn to_cell(&self) -> CellValue {
        i64::try_from(*self).map_or(CellValue::Float(*self as f64), CellValue::Int)
    }

    fn from_cell(value: CellValue) -> Result<Self, ConvertError> {
        match value {
            CellValue::Int(i) => u64::try_from(i).or_else(|_| mismatch(Self::VALUE_TYPE, &value)),
            CellValue::Empty => Ok(0),
            other => mismatch(Self::VALUE_TYPE, &other),
        }
    }
}

impl FieldValue for f64 {
    const VALUE_TYPE: ValueType = ValueType::Float;

    fn to_cell(&self) -> CellValue {
        CellValue::Float(*self)
    }

    fn from_cell(value: CellValue) -> Result<Self, ConvertError> {
        match value {
            CellValue::Float(f) => Ok(f),
            CellValue::Empty => Ok(0.0),
            other => mismatch(Self::VALUE_TYPE, &other),
        }
    }
}

impl FieldValue for String {
    const VALUE_TYPE: ValueType = ValueType::Text;

    fn to_cell(&self) -> CellValue {
        CellValue::Text(self.clone())
    }

    fn from_cell(value: CellValue) -> Result<Self, ConvertError> {
        match value {
            CellValue::Text(s) => Ok(s),
            CellValue::Empty => Ok(String::new()),
            other => mismatch(Self::VALUE_TYPE, &other),
        }
    }
}

impl FieldValue for NaiveDateTime {
    const VALUE_TYPE: ValueType = ValueType::DateTime;

    fn to_cell(&self) -> CellValue {
        CellValue::DateTime(*self)
    }

    fn from_cell(value: CellValue) -> Result<Self, ConvertError> {
        match value {
            CellValue::DateTime(dt) => Ok(dt),
            CellValue::Empty => Ok(NaiveDateTime::default()),
            other => mismatch(Self::VALUE_TYPE, &other),
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    const VALUE_TYPE: ValueType = T::VALUE_TYPE;
    const NULLABLE: bool = true;

    fn to_cell(&self) -> CellValue {
        self.as_ref().map_or(CellValue::Empty, FieldValue::to_cell)
    }

    fn from_cell(value: CellValue) -> Result<Self, ConvertError> {
        match value {
            CellValue::Empty => Ok(None),
            other => T::from_cell(other).map(Some),
        }
    }
}

/// Coerces a raw cell to `T` and back, giving the canonical cell form of
/// a `T` value. Used to compare keys read from cells with keys supplied by
/// callers.
pub(crate) fn normalize<T: FieldValue>(raw: &CellValue) -> Result<CellValue, ConvertError> {
    let coerced = T::VALUE_TYPE.coerce(raw)?;
    Ok(T::from_cell(coerced)?.to_cell())
}
