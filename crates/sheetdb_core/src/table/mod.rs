//! The row store: one table of entities on one worksheet.
//!
//! Row 1 of the sheet is the header; every following row holds one entity.
//! The pieces are layered the same way every mutation runs:
//!
//! 1. [`ColumnIndex`] resolves header names to positions
//! 2. schema evolution appends mapped columns the header lacks
//! 3. rows are converted to entities and back
//! 4. identity keys are allocated on insert
//! 5. updates and deletes match rows by key
//!
//! [`TableStore`] ties them together and persists after each edit.

mod column_index;
mod identity;
mod rows;
mod schema;
mod store;

pub use column_index::ColumnIndex;
pub use rows::RowScan;
pub use store::TableStore;
