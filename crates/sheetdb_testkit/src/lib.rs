//! # sheetdb Testkit
//!
//! Test utilities for sheetdb.
//!
//! This crate provides:
//! - Sample entities ([`Person`], [`Tag`]) with their descriptors
//! - Test database helpers (in-memory and temporary-file workbooks)
//! - Property-based test generators using proptest
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use sheetdb_testkit::prelude::*;
//!
//! with_temp_db(|db| {
//!     let people = db.table::<Person>().unwrap();
//!     people.create_table().unwrap();
//!     people.add(Person::new("Ada")).unwrap();
//!     assert_eq!(people.count().unwrap(), 1);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
