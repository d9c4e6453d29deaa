//! In-memory worksheet.

use crate::date::serial_to_datetime;
use crate::error::{CodecError, CodecResult};
use crate::value::CellValue;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// Last addressable row in an xlsx worksheet.
pub const MAX_ROWS: u32 = 1_048_576;
/// Last addressable column in an xlsx worksheet.
pub const MAX_COLUMNS: u32 = 16_384;

static EMPTY: CellValue = CellValue::Empty;

/// Bounds of the used area of a worksheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimension {
    /// Last used row (1-based).
    pub end_row: u32,
    /// Last used column (1-based).
    pub end_column: u32,
}

/// One sheet of a workbook: a sparse grid of cells addressed by 1-based
/// `(row, column)`, plus per-column presentation settings.
///
/// The used area grows with every [`Worksheet::set`], including writes of
/// [`CellValue::Empty`], so a row written with no values still counts as a
/// row. Only [`Worksheet::delete_rows`] and [`Worksheet::delete_row_set`]
/// shrink it. xlsx stores no cell for an empty value, so a trailing row
/// without values does not survive an encode/decode round trip.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Worksheet {
    name: String,
    cells: BTreeMap<(u32, u32), CellValue>,
    end_row: u32,
    end_column: u32,
    column_formats: BTreeMap<u32, String>,
    column_widths: BTreeMap<u32, f64>,
}

impl Worksheet {
    /// Creates an empty worksheet. Name validation happens in
    /// [`crate::Workbook::add_sheet`].
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The sheet name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the used area, or `None` when nothing was ever written.
    #[must_use]
    pub fn dimension(&self) -> Option<Dimension> {
        if self.end_row == 0 || self.end_column == 0 {
            return None;
        }
        Some(Dimension {
            end_row: self.end_row,
            end_column: self.end_column,
        })
    }

    /// Last used row, 0 when the sheet is empty.
    #[must_use]
    pub fn last_row(&self) -> u32 {
        self.end_row
    }

    /// Last used column, 0 when the sheet is empty.
    #[must_use]
    pub fn last_column(&self) -> u32 {
        self.end_column
    }

    /// Returns the value at `(row, column)`; unset cells read as empty.
    #[must_use]
    pub fn get(&self, row: u32, column: u32) -> &CellValue {
        self.cells.get(&(row, column)).unwrap_or(&EMPTY)
    }

    /// Date-aware accessor.
    ///
    /// Returns the timestamp for date/time cells and for numeric cells
    /// holding an Excel serial date (how xlsx stores dates on disk).
    /// Every other cell yields `None`.
    #[must_use]
    pub fn get_datetime(&self, row: u32, column: u32) -> Option<NaiveDateTime> {
        match self.get(row, column) {
            CellValue::DateTime(dt) => Some(*dt),
            CellValue::Float(serial) => serial_to_datetime(*serial),
            #[allow(clippy::cast_precision_loss)]
            CellValue::Int(serial) => serial_to_datetime(*serial as f64),
            _ => None,
        }
    }

    /// Sets the value at `(row, column)` and marks it used. Setting
    /// [`CellValue::Empty`] clears the cell.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::CellOutOfRange`] for addresses outside the
    /// xlsx grid (rows and columns are 1-based).
    pub fn set(&mut self, row: u32, column: u32, value: CellValue) -> CodecResult<()> {
        check_address(row, column)?;
        if value.is_empty() {
            self.cells.remove(&(row, column));
        } else {
            self.cells.insert((row, column), value);
        }
        self.end_row = self.end_row.max(row);
        self.end_column = self.end_column.max(column);
        Ok(())
    }

    /// Values of one row from column 1 to the last used column.
    #[must_use]
    pub fn row_values(&self, row: u32) -> Vec<CellValue> {
        (1..=self.last_column())
            .map(|column| self.get(row, column).clone())
            .collect()
    }

    /// Deletes `count` rows starting at `start`, shifting later rows up.
    pub fn delete_rows(&mut self, start: u32, count: u32) {
        if count == 0 || start == 0 {
            return;
        }
        let end = start.saturating_add(count);
        let cells = std::mem::take(&mut self.cells);
        self.cells = cells
            .into_iter()
            .filter_map(|((row, column), value)| {
                if row < start {
                    Some(((row, column), value))
                } else if row >= end {
                    Some(((row - count, column), value))
                } else {
                    None
                }
            })
            .collect();

        if start <= self.end_row {
            let removed = end.min(self.end_row.saturating_add(1)) - start;
            self.shrink_rows(removed);
        }
    }

    /// Deletes every listed row in one pass, shifting the rest up.
    ///
    /// Row numbers refer to the sheet before the call; duplicates and rows
    /// past the used area are ignored.
    pub fn delete_row_set(&mut self, rows: impl IntoIterator<Item = u32>) {
        let mut doomed: Vec<u32> = rows
            .into_iter()
            .filter(|row| (1..=self.end_row).contains(row))
            .collect();
        doomed.sort_unstable();
        doomed.dedup();
        if doomed.is_empty() {
            return;
        }

        let cells = std::mem::take(&mut self.cells);
        self.cells = cells
            .into_iter()
            .filter_map(|((row, column), value)| match doomed.binary_search(&row) {
                Ok(_) => None,
                Err(above) => Some(((row - above as u32, column), value)),
            })
            .collect();

        self.shrink_rows(doomed.len() as u32);
    }

    fn shrink_rows(&mut self, removed: u32) {
        self.end_row -= removed;
        if self.end_row == 0 {
            self.end_column = 0;
        }
    }

    /// Iterates populated cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, &CellValue)> {
        self.cells.iter().map(|(&(r, c), v)| (r, c, v))
    }

    /// Sets the number format applied to a whole column.
    pub fn set_column_format(&mut self, column: u32, format: impl Into<String>) {
        self.column_formats.insert(column, format.into());
    }

    /// Returns the number format of a column, if one was set.
    #[must_use]
    pub fn column_format(&self, column: u32) -> Option<&str> {
        self.column_formats.get(&column).map(String::as_str)
    }

    /// Iterates column number formats.
    pub fn column_formats(&self) -> impl Iterator<Item = (u32, &str)> {
        self.column_formats.iter().map(|(&c, f)| (c, f.as_str()))
    }

    /// Sets the display width of a column, in character units.
    pub fn set_column_width(&mut self, column: u32, width: f64) {
        self.column_widths.insert(column, width);
    }

    /// Iterates column widths.
    pub fn column_widths(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.column_widths.iter().map(|(&c, &w)| (c, w))
    }
}

fn check_address(row: u32, column: u32) -> CodecResult<()> {
    if row == 0 || column == 0 || row > MAX_ROWS || column > MAX_COLUMNS {
        return Err(CodecError::CellOutOfRange { row, column });
    }
    Ok(())
}
