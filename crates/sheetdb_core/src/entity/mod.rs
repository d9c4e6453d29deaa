//! Entity mapping.
//!
//! An [`EntityDescriptor`] tells the row store how one Rust type maps onto
//! a table: which columns exist, their declared [`ValueType`](crate::ValueType),
//! the accessors used to read and write each property, and which property
//! is the key.

mod descriptor;
mod field;

pub use descriptor::{ColumnDescriptor, EntityDescriptor, EntityDescriptorBuilder};
pub use field::FieldValue;
