//! # sheetdb Storage
//!
//! Storage backend trait and implementations for sheetdb.
//!
//! This crate provides the lowest-level persistence abstraction for sheetdb.
//! A backend holds exactly one serialized workbook and treats it as an
//! **opaque byte string** - it never interprets the bytes it stores.
//!
//! ## Design Principles
//!
//! - Backends store whole documents (read everything, replace everything)
//! - No knowledge of xlsx, sheets, or rows
//! - Must be `Send + Sync` so a database handle can be shared across threads
//! - The codec crate owns all format interpretation
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral databases
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use sheetdb_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! assert!(backend.read_all().unwrap().is_none());
//!
//! backend.replace(b"workbook bytes").unwrap();
//! assert_eq!(backend.read_all().unwrap().as_deref(), Some(&b"workbook bytes"[..]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
