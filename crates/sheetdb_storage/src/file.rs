//! File-based storage backend for persistent storage.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// A file-based storage backend.
///
/// The document lives in a single file. Nothing touches the disk until the
/// first read or replace, so opening a backend for a file that does not
/// exist yet is fine.
///
/// # Durability
///
/// `replace()` writes the new document to a sibling temporary file, syncs
/// it, and renames it over the target. A crash mid-write leaves the
/// previous document intact.
///
/// # Example
///
/// ```no_run
/// use sheetdb_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("data.xlsx")).unwrap();
/// backend.replace(b"document").unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Opens a file backend at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path names an existing directory or has no
    /// file name component.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if path.file_name().is_none() {
            return Err(StorageError::InvalidPath {
                path: path.to_path_buf(),
                reason: "path has no file name".to_string(),
            });
        }
        if path.is_dir() {
            return Err(StorageError::InvalidPath {
                path: path.to_path_buf(),
                reason: "path is a directory".to_string(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    /// Opens a file backend, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the path is invalid.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Self::open(path)
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StorageBackend for FileBackend {
    fn read_all(&self) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn replace(&mut self, data: &[u8]) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        let temp = self.temp_path();

        {
            let mut file: File = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp)?;
            file.write_all(data)?;
            file.sync_all()?;
        }

        if let Err(e) = fs::rename(&temp, &self.path) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(())
    }

    fn exists(&self) -> StorageResult<bool> {
        Ok(self.path.try_exists()?)
    }

    fn size(&self) -> StorageResult<u64> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_open_does_not_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.xlsx");

        let backend = FileBackend::open(&path).unwrap();
        assert!(!backend.exists().unwrap());
        assert!(backend.read_all().unwrap().is_none());
        assert_eq!(backend.size().unwrap(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn file_replace_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.xlsx");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.replace(b"hello world").unwrap();

        assert!(backend.exists().unwrap());
        assert_eq!(backend.size().unwrap(), 11);
        assert_eq!(backend.read_all().unwrap(), Some(b"hello world".to_vec()));
    }

    #[test]
    fn file_replace_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.xlsx");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.replace(b"data").unwrap();

        assert!(!dir.path().join("test.xlsx.tmp").exists());
    }

    #[test]
    fn file_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.xlsx");

        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.replace(b"persistent data").unwrap();
        }

        {
            let backend = FileBackend::open(&path).unwrap();
            assert_eq!(backend.read_all().unwrap(), Some(b"persistent data".to_vec()));
        }
    }

    #[test]
    fn file_create_with_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("path").join("test.xlsx");

        let mut backend = FileBackend::open_with_create_dirs(&path).unwrap();
        backend.replace(b"x").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn file_directory_path_rejected() {
        let dir = tempdir().unwrap();
        let result = FileBackend::open(dir.path());
        assert!(matches!(result, Err(StorageError::InvalidPath { .. })));
    }

    #[test]
    fn file_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.xlsx");

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.path(), path);
        assert_eq!(backend.location(), path.display().to_string());
    }
}
