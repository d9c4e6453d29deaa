//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level storage backend for sheetdb.
///
/// Storage backends are **opaque document stores**. They hold the complete
/// serialized workbook and support two operations on it: read it all, or
/// replace it all. sheetdb never persists partial edits; every flush writes
/// the whole document.
///
/// # Invariants
///
/// - `read_all` returns `None` until the first successful `replace`
/// - `read_all` returns exactly the bytes passed to the last `replace`
/// - `replace` is all-or-nothing: a failed replace leaves the previous
///   document readable
/// - Backends must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync {
    /// Reads the whole stored document.
    ///
    /// Returns `None` if no document has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn read_all(&self) -> StorageResult<Option<Vec<u8>>>;

    /// Replaces the stored document with `data`.
    ///
    /// After this returns successfully, the new document is durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails. The previous document is
    /// left in place.
    fn replace(&mut self, data: &[u8]) -> StorageResult<()>;

    /// Returns whether a document has been stored.
    ///
    /// # Errors
    ///
    /// Returns an error if existence cannot be determined.
    fn exists(&self) -> StorageResult<bool>;

    /// Returns the size of the stored document in bytes (0 when absent).
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Returns a human readable description of where the document lives.
    fn location(&self) -> String;
}
