//! Workbook → xlsx encoding.

use crate::date::datetime_to_serial;
use crate::error::{CodecError, CodecResult};
use crate::sheet::Worksheet;
use crate::value::CellValue;
use crate::workbook::Workbook;
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, Worksheet as XlsxWorksheet, XlsxError};

/// Number format written for date/time cells in columns without their own format.
pub const DEFAULT_DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Encodes a workbook as an xlsx package.
///
/// An xlsx package must contain at least one sheet, so a workbook without
/// sheets encodes to an empty byte vector; [`crate::decode_workbook`]
/// reads that back as an empty workbook.
///
/// Integers are stored as xlsx numbers (doubles) and round-trip exactly up
/// to 2^53. Date/time cells are stored as serial numbers carrying the
/// column's number format, or [`DEFAULT_DATETIME_FORMAT`].
///
/// # Errors
///
/// Returns [`CodecError::Write`] if the xlsx writer rejects the content.
pub fn encode_workbook(workbook: &Workbook) -> CodecResult<Vec<u8>> {
    if workbook.is_empty() {
        return Ok(Vec::new());
    }

    let mut out = XlsxWorkbook::new();
    for sheet in workbook.sheets() {
        let worksheet = out.add_worksheet();
        write_sheet(worksheet, sheet)?;
    }

    out.save_to_buffer().map_err(xlsx_err)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn write_sheet(worksheet: &mut XlsxWorksheet, sheet: &Worksheet) -> CodecResult<()> {
    worksheet.set_name(sheet.name()).map_err(xlsx_err)?;

    for (column, format) in sheet.column_formats() {
        let format = Format::new().set_num_format(format);
        worksheet
            .set_column_format(column as u16 - 1, &format)
            .map_err(xlsx_err)?;
    }
    for (column, width) in sheet.column_widths() {
        worksheet
            .set_column_width(column as u16 - 1, width)
            .map_err(xlsx_err)?;
    }

    let default_date_format = Format::new().set_num_format(DEFAULT_DATETIME_FORMAT);

    for (row, column, value) in sheet.cells() {
        let (r, c) = (row - 1, column as u16 - 1);
        match value {
            CellValue::Empty => {}
            CellValue::Bool(b) => {
                worksheet.write_boolean(r, c, *b).map_err(xlsx_err)?;
            }
            CellValue::Int(i) => {
                worksheet.write_number(r, c, *i as f64).map_err(xlsx_err)?;
            }
            CellValue::Float(f) => {
                worksheet.write_number(r, c, *f).map_err(xlsx_err)?;
            }
            CellValue::Text(s) => {
                worksheet.write_string(r, c, s).map_err(xlsx_err)?;
            }
            CellValue::DateTime(dt) => {
                let format = match sheet.column_format(column) {
                    Some(f) => Format::new().set_num_format(f),
                    None => default_date_format.clone(),
                };
                worksheet
                    .write_number_with_format(r, c, datetime_to_serial(*dt), &format)
                    .map_err(xlsx_err)?;
            }
        }
    }

    Ok(())
}

fn xlsx_err(err: XlsxError) -> CodecError {
    CodecError::write(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_workbook_encodes_to_nothing() {
        assert!(encode_workbook(&Workbook::new()).unwrap().is_empty());
    }

    #[test]
    fn non_empty_workbook_is_a_zip_package() {
        let mut wb = Workbook::new();
        wb.add_sheet("people")
            .unwrap()
            .set(1, 1, CellValue::from("Id"))
            .unwrap();

        let bytes = encode_workbook(&wb).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
