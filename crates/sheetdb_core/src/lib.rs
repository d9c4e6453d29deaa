//! # sheetdb Core
//!
//! Entity-to-row mapping and CRUD engine for sheetdb.
//!
//! This crate provides:
//! - [`EntityDescriptor`] to map a Rust type onto a table (one sheet)
//! - [`TableStore`] for create/read/update/delete over that table
//! - [`Database`], the handle that owns one workbook and a registry of
//!   entity types
//! - [`FilterRule`] / [`FilterService`] for `{field, operator, value}` queries
//!
//! Row 1 of every table holds the column names; each following row holds
//! one entity. Queries are full-table scans and every mutation writes the
//! whole workbook back to storage.
//!
//! ## Async
//!
//! With the `async` feature, mutating operations gain `*_async` variants
//! that move the final write to storage onto tokio's blocking pool.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod document;
mod entity;
mod error;
mod filter;
mod table;
mod types;

pub use config::{Config, CONNECTION_STRING_KEY};
pub use database::Database;
pub use entity::{ColumnDescriptor, EntityDescriptor, EntityDescriptorBuilder, FieldValue};
pub use error::{CoreError, CoreResult};
pub use filter::{DefaultFilterService, FilterOperator, FilterRule, FilterService, FilterValue, Predicate};
pub use table::{ColumnIndex, RowScan, TableStore};
pub use types::{ConvertError, ValueType};

pub use sheetdb_codec::CellValue;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
