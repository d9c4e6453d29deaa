//! The open workbook behind a database handle.

use crate::error::CoreResult;
use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, Mutex, RwLock, RwLockReadGuard,
    RwLockWriteGuard,
};
use sheetdb_codec::{decode_workbook, encode_workbook, Workbook};
use sheetdb_storage::StorageBackend;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Lazily loaded workbook plus the backend it is flushed to.
///
/// The workbook is read from storage on first access and kept until
/// [`Document::close`]. Nothing is written back implicitly: every flush is
/// an explicit [`Document::save`] or [`PendingFlush::run`].
pub(crate) struct Document {
    workbook: RwLock<Option<Workbook>>,
    flusher: Arc<Mutex<Flusher>>,
    /// Bumped on load, close, flush and header changes. Column index
    /// caches compare against it.
    generation: AtomicU64,
    sequence: AtomicU64,
    location: String,
}

struct Flusher {
    backend: Box<dyn StorageBackend>,
    written: u64,
}

impl Flusher {
    fn write(&mut self, sequence: u64, bytes: &[u8]) -> CoreResult<bool> {
        // An older snapshot finishing late must not overwrite a newer one.
        if sequence <= self.written {
            return Ok(false);
        }
        self.backend.replace(bytes)?;
        self.written = sequence;
        Ok(true)
    }
}

/// An encoded snapshot waiting to be written to storage.
#[must_use = "a pending flush does nothing until run"]
pub(crate) struct PendingFlush {
    bytes: Vec<u8>,
    sequence: u64,
    flusher: Arc<Mutex<Flusher>>,
    location: String,
}

impl PendingFlush {
    /// Writes the snapshot on the current thread.
    pub(crate) fn run(self) -> CoreResult<()> {
        let written = self.flusher.lock().write(self.sequence, &self.bytes)?;
        if written {
            tracing::info!(location = %self.location, bytes = self.bytes.len(), "document saved");
        } else {
            tracing::debug!(location = %self.location, "stale snapshot skipped");
        }
        Ok(())
    }

    /// Writes the snapshot on the blocking thread pool.
    #[cfg(feature = "async")]
    pub(crate) async fn run_async(self) -> CoreResult<()> {
        tokio::task::spawn_blocking(move || self.run())
            .await
            .map_err(|e| crate::error::CoreError::BackgroundTask {
                message: e.to_string(),
            })?
    }
}

impl Document {
    pub(crate) fn new(backend: Box<dyn StorageBackend>) -> Self {
        let location = backend.location();
        Self {
            workbook: RwLock::new(None),
            flusher: Arc::new(Mutex::new(Flusher { backend, written: 0 })),
            generation: AtomicU64::new(0),
            sequence: AtomicU64::new(0),
            location,
        }
    }

    pub(crate) fn location(&self) -> &str {
        &self.location
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Marks cached header state as stale. Call with the write lock held.
    pub(crate) fn touch(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn is_loaded(&self) -> bool {
        self.workbook.read().is_some()
    }

    fn load(&self) -> CoreResult<Workbook> {
        let bytes = self.flusher.lock().backend.read_all()?;
        let workbook = match bytes {
            Some(bytes) => decode_workbook(&bytes)?,
            None => Workbook::new(),
        };
        tracing::info!(
            location = %self.location,
            sheets = workbook.sheet_names().len(),
            "document loaded"
        );
        Ok(workbook)
    }

    fn load_into(&self, slot: &mut Option<Workbook>) -> CoreResult<()> {
        if slot.is_none() {
            *slot = Some(self.load()?);
            self.touch();
        }
        Ok(())
    }

    /// Shared access to the workbook, loading it first if needed.
    pub(crate) fn read(&self) -> CoreResult<MappedRwLockReadGuard<'_, Workbook>> {
        loop {
            match RwLockReadGuard::try_map(self.workbook.read(), Option::as_ref) {
                Ok(guard) => return Ok(guard),
                Err(guard) => {
                    drop(guard);
                    let mut slot = self.workbook.write();
                    self.load_into(&mut slot)?;
                }
            }
        }
    }

    /// Exclusive access to the workbook, loading it first if needed.
    pub(crate) fn write(&self) -> CoreResult<MappedRwLockWriteGuard<'_, Workbook>> {
        let mut slot = self.workbook.write();
        self.load_into(&mut slot)?;
        Ok(RwLockWriteGuard::map(slot, |w| w.get_or_insert_with(Workbook::new)))
    }

    /// Encodes `workbook` for a later write.
    pub(crate) fn snapshot(&self, workbook: &Workbook) -> CoreResult<PendingFlush> {
        let bytes = encode_workbook(workbook)?;
        let sequence = self.sequence.fetch_add(1, Ordering::AcqRel) + 1;
        self.touch();
        Ok(PendingFlush {
            bytes,
            sequence,
            flusher: Arc::clone(&self.flusher),
            location: self.location.clone(),
        })
    }

    /// Encodes and writes `workbook` now.
    pub(crate) fn save(&self, workbook: &Workbook) -> CoreResult<()> {
        self.snapshot(workbook)?.run()
    }

    /// Drops the in-memory workbook without writing it.
    pub(crate) fn close(&self) {
        let mut slot = self.workbook.write();
        if slot.take().is_some() {
            self.touch();
            tracing::debug!(location = %self.location, "document closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetdb_codec::CellValue;
    use sheetdb_storage::InMemoryBackend;

    #[test]
    fn absent_storage_loads_empty() {
        let doc = Document::new(Box::new(InMemoryBackend::new()));
        assert!(!doc.is_loaded());
        assert!(doc.read().unwrap().is_empty());
        assert!(doc.is_loaded());
    }

    #[test]
    fn close_discards_unsaved_edits() {
        let backend = InMemoryBackend::new();
        let doc = Document::new(Box::new(backend.clone()));

        {
            let mut wb = doc.write().unwrap();
            wb.add_sheet("kept").unwrap();
            doc.save(&wb).unwrap();
            wb.add_sheet("lost").unwrap();
        }
        doc.close();

        assert_eq!(doc.read().unwrap().sheet_names(), vec!["kept"]);
        assert!(backend.data().is_some());
    }

    #[test]
    fn stale_snapshot_is_skipped() {
        let backend = InMemoryBackend::new();
        let doc = Document::new(Box::new(backend.clone()));

        let (old, new) = {
            let mut wb = doc.write().unwrap();
            let sheet = wb.add_sheet("t").unwrap();
            sheet.set(1, 1, CellValue::from("old")).unwrap();
            let old = doc.snapshot(&wb).unwrap();
            let sheet = wb.sheet_mut("t").unwrap();
            sheet.set(1, 1, CellValue::from("new")).unwrap();
            (old, doc.snapshot(&wb).unwrap())
        };
        new.run().unwrap();
        old.run().unwrap();

        let stored = decode_workbook(&backend.data().unwrap()).unwrap();
        assert_eq!(stored.sheet("t").unwrap().get(1, 1), &CellValue::from("new"));
    }

    #[test]
    fn generation_moves_on_save_and_close() {
        let doc = Document::new(Box::new(InMemoryBackend::new()));
        let loaded = {
            let wb = doc.write().unwrap();
            let g = doc.generation();
            doc.save(&wb).unwrap();
            assert!(doc.generation() > g);
            doc.generation()
        };
        doc.close();
        assert!(doc.generation() > loaded);
    }
}
