//! xlsx → Workbook decoding.

use crate::error::{CodecError, CodecResult};
use crate::sheet::Worksheet;
use crate::value::CellValue;
use crate::workbook::Workbook;
use calamine::{Data, Reader, Xlsx};
use chrono::NaiveDateTime;
use std::io::Cursor;

/// Decodes an xlsx package into a workbook.
///
/// Empty input decodes to an empty workbook (see
/// [`crate::encode_workbook`]). Numeric cells carrying a date number
/// format become [`CellValue::DateTime`]; formula error cells become text.
/// Column formats are not recovered: xlsx keeps them as styles that the
/// reader does not expose.
///
/// # Errors
///
/// Returns [`CodecError::Read`] if the bytes are not a readable xlsx package.
pub fn decode_workbook(bytes: &[u8]) -> CodecResult<Workbook> {
    let mut workbook = Workbook::new();
    if bytes.is_empty() {
        return Ok(workbook);
    }

    let mut xlsx: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| CodecError::read(format!("open package: {e}")))?;
    let sheet_names = xlsx.sheet_names().to_owned();

    for sheet_name in sheet_names {
        let range = xlsx
            .worksheet_range(&sheet_name)
            .map_err(|e| CodecError::read(format!("read worksheet {sheet_name}: {e}")))?;

        let mut sheet = Worksheet::new(sheet_name.clone());
        let (row_offset, col_offset) = range.start().unwrap_or((0, 0));

        for (row, col, cell) in range.cells() {
            let value = cell_value(cell);
            if value.is_empty() {
                continue;
            }
            let row = row_offset + row as u32 + 1;
            let column = col_offset + col as u32 + 1;
            sheet.set(row, column, value)?;
        }

        workbook.push_sheet(sheet)?;
    }

    Ok(workbook)
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Float(*f),
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => CellValue::DateTime(value),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_iso(s).map_or_else(|| CellValue::Text(s.clone()), CellValue::DateTime),
        Data::Error(e) => CellValue::Text(format!("{e}")),
        other => CellValue::Text(other.to_string()),
    }
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()
}
