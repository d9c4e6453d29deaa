//! In-memory storage backend for testing.

use crate::backend::StorageBackend;
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::sync::Arc;

/// An in-memory storage backend.
///
/// This backend keeps the document in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral databases that don't need persistence
///
/// Clones share the same buffer, so a clone kept by a test observes
/// everything a database handle flushes through another clone. This is
/// how tests simulate closing and reopening a document.
///
/// # Example
///
/// ```rust
/// use sheetdb_storage::{StorageBackend, InMemoryBackend};
///
/// let mut backend = InMemoryBackend::new();
/// let observer = backend.clone();
///
/// backend.replace(b"v1").unwrap();
/// assert_eq!(observer.data(), Some(b"v1".to_vec()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    data: Arc<RwLock<Option<Vec<u8>>>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory backend holding a pre-existing document.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(RwLock::new(Some(data))),
        }
    }

    /// Returns a copy of the stored document.
    #[must_use]
    pub fn data(&self) -> Option<Vec<u8>> {
        self.data.read().clone()
    }

    /// Forgets the stored document.
    pub fn clear(&mut self) {
        *self.data.write() = None;
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_all(&self) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.data.read().clone())
    }

    fn replace(&mut self, data: &[u8]) -> StorageResult<()> {
        *self.data.write() = Some(data.to_vec());
        Ok(())
    }

    fn exists(&self) -> StorageResult<bool> {
        Ok(self.data.read().is_some())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.read().as_ref().map_or(0, |d| d.len() as u64))
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_new_is_empty() {
        let backend = InMemoryBackend::new();
        assert!(!backend.exists().unwrap());
        assert_eq!(backend.size().unwrap(), 0);
        assert!(backend.read_all().unwrap().is_none());
    }

    #[test]
    fn memory_replace_then_read() {
        let mut backend = InMemoryBackend::new();
        backend.replace(b"hello").unwrap();

        assert!(backend.exists().unwrap());
        assert_eq!(backend.size().unwrap(), 5);
        assert_eq!(backend.read_all().unwrap(), Some(b"hello".to_vec()));
    }

    #[test]
    fn memory_replace_overwrites_whole_document() {
        let mut backend = InMemoryBackend::new();
        backend.replace(b"hello world").unwrap();
        backend.replace(b"bye").unwrap();

        assert_eq!(backend.read_all().unwrap(), Some(b"bye".to_vec()));
        assert_eq!(backend.size().unwrap(), 3);
    }

    #[test]
    fn memory_empty_document_still_exists() {
        let mut backend = InMemoryBackend::new();
        backend.replace(b"").unwrap();

        assert!(backend.exists().unwrap());
        assert_eq!(backend.read_all().unwrap(), Some(Vec::new()));
    }

    #[test]
    fn memory_clones_share_buffer() {
        let mut backend = InMemoryBackend::new();
        let observer = backend.clone();

        backend.replace(b"shared").unwrap();
        assert_eq!(observer.data(), Some(b"shared".to_vec()));
    }

    #[test]
    fn memory_with_data() {
        let backend = InMemoryBackend::with_data(b"preloaded".to_vec());
        assert_eq!(backend.size().unwrap(), 9);
        assert_eq!(backend.read_all().unwrap(), Some(b"preloaded".to_vec()));
    }

    #[test]
    fn memory_clear() {
        let mut backend = InMemoryBackend::new();
        backend.replace(b"some data").unwrap();
        backend.clear();
        assert!(!backend.exists().unwrap());
    }
}
