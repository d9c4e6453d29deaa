//! # sheetdb Codec
//!
//! The tabular document model for sheetdb and its xlsx encoding.
//!
//! This crate provides:
//! - [`CellValue`], the dynamic value of one cell
//! - [`Workbook`] / [`Worksheet`], a sparse in-memory grid addressed by
//!   1-based `(row, column)`
//! - [`decode_workbook`] / [`encode_workbook`], xlsx reading (calamine) and
//!   writing (rust_xlsxwriter)
//! - Excel serial date conversion
//!
//! The row store in `sheetdb_core` only talks to the in-memory model; bytes
//! only exist at load and flush time.
//!
//! ## Usage
//!
//! ```
//! use sheetdb_codec::{decode_workbook, encode_workbook, CellValue, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.add_sheet("people").unwrap();
//! sheet.set(1, 1, CellValue::from("Name")).unwrap();
//! sheet.set(2, 1, CellValue::from("Ada")).unwrap();
//!
//! let bytes = encode_workbook(&workbook).unwrap();
//! let decoded = decode_workbook(&bytes).unwrap();
//! assert_eq!(decoded.sheet("people").unwrap().get(2, 1), &CellValue::from("Ada"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod date;
mod decoder;
mod encoder;
mod error;
mod sheet;
mod value;
mod workbook;

pub use date::{datetime_to_serial, serial_to_datetime};
pub use decoder::decode_workbook;
pub use encoder::{encode_workbook, DEFAULT_DATETIME_FORMAT};
pub use error::{CodecError, CodecResult};
pub use sheet::{Dimension, Worksheet, MAX_COLUMNS, MAX_ROWS};
pub use value::{CellValue, DATETIME_TEXT_FORMAT};
pub use workbook::{validate_sheet_name, Workbook, MAX_SHEET_NAME_LEN};
