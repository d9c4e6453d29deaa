//! Database facade and entity registry.

use crate::config::Config;
use crate::document::Document;
use crate::entity::EntityDescriptor;
use crate::error::{CoreError, CoreResult};
use crate::table::TableStore;
use parking_lot::RwLock;
use sheetdb_codec::Workbook;
use sheetdb_storage::{FileBackend, InMemoryBackend, StorageBackend, StorageError};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

type Erased = Arc<dyn Any + Send + Sync>;

/// The main database handle: one workbook, one table per entity type.
///
/// The workbook is loaded from storage on first use and kept in memory
/// until [`Database::close`]. Every mutating table operation writes the
/// whole workbook back; nothing is flushed on close or drop.
///
/// # Opening a Database
///
/// ```rust,ignore
/// use sheetdb_core::{Config, Database};
///
/// let db = Database::open(Config::for_path("data/shop.xlsx"))?;
/// db.register(product_descriptor());
///
/// let products = db.table::<Product>()?;
/// products.create_table()?;
/// products.add(Product::new("lamp"))?;
/// ```
///
/// # In-Memory Databases
///
/// For testing, use `Database::open_in_memory()`:
///
/// ```rust,ignore
/// let db = Database::open_in_memory();
/// ```
pub struct Database {
    config: Config,
    document: Arc<Document>,
    /// Descriptors by entity type.
    descriptors: RwLock<HashMap<TypeId, Erased>>,
    /// Table stores by entity type, created on first use.
    tables: RwLock<HashMap<TypeId, Erased>>,
}

impl Database {
    /// Opens the workbook at the configured path.
    ///
    /// No I/O happens until the first table operation; a missing file
    /// reads as an empty workbook and is created on the first save.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Storage`] if no path is configured or the path
    /// is unusable.
    pub fn open(config: Config) -> CoreResult<Self> {
        let path = config.path.clone().ok_or_else(|| {
            CoreError::from(StorageError::InvalidPath {
                path: PathBuf::new(),
                reason: "no workbook path configured".into(),
            })
        })?;
        let backend = if config.create_dirs {
            FileBackend::open_with_create_dirs(&path)?
        } else {
            FileBackend::open(&path)?
        };
        Ok(Self::with_backend(config, backend))
    }

    /// Opens an empty database held in memory.
    #[must_use]
    pub fn open_in_memory() -> Self {
        Self::with_backend(Config::default(), InMemoryBackend::new())
    }

    /// Opens a database over an arbitrary backend.
    pub fn with_backend(config: Config, backend: impl StorageBackend + 'static) -> Self {
        let document = Arc::new(Document::new(Box::new(backend)));
        tracing::debug!(location = document.location(), "database opened");
        Self {
            config,
            document,
            descriptors: RwLock::new(HashMap::new()),
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// The configuration the database was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Human readable location of the workbook.
    #[must_use]
    pub fn location(&self) -> &str {
        self.document.location()
    }

    /// Name of the database: the workbook file name without extension.
    #[must_use]
    pub fn database_name(&self) -> Option<String> {
        self.config.database_name()
    }

    /// Switches to `<name>.xlsx` next to the current workbook.
    ///
    /// The loaded workbook is dropped without saving and cached table
    /// stores are forgotten; registered descriptors are kept. Stores
    /// obtained earlier keep pointing at the previous workbook.
    ///
    /// # Errors
    ///
    /// Fails for databases without a file path, or if the new path is
    /// unusable.
    pub fn change_database(&mut self, name: &str) -> CoreResult<()> {
        if self.config.path.is_none() {
            return Err(StorageError::InvalidPath {
                path: PathBuf::from(name),
                reason: "database has no file path to switch from".into(),
            }
            .into());
        }
        let reopened = Self::open(self.config.with_database(name))?;
        tracing::info!(
            from = self.document.location(),
            to = reopened.document.location(),
            "database changed"
        );
        self.config = reopened.config;
        self.document = reopened.document;
        self.tables.write().clear();
        Ok(())
    }

    /// Registers how entities of type `E` map onto a table.
    ///
    /// Registering `E` again replaces the descriptor and forgets the
    /// cached store.
    pub fn register<E: 'static>(&self, descriptor: EntityDescriptor<E>) {
        let id = TypeId::of::<E>();
        tracing::debug!(
            entity = descriptor.entity_name(),
            table = descriptor.table_name(),
            "entity registered"
        );
        self.descriptors.write().insert(id, Arc::new(descriptor));
        self.tables.write().remove(&id);
    }

    /// Whether a descriptor is registered for `E`.
    #[must_use]
    pub fn is_registered<E: 'static>(&self) -> bool {
        self.descriptors.read().contains_key(&TypeId::of::<E>())
    }

    /// The table store for `E`, created once and shared afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EntityNotRegistered`] if `E` was never
    /// registered.
    pub fn table<E: 'static>(&self) -> CoreResult<Arc<TableStore<E>>> {
        let id = TypeId::of::<E>();
        let not_registered = || CoreError::EntityNotRegistered {
            type_name: std::any::type_name::<E>(),
        };

        if let Some(store) = self.tables.read().get(&id) {
            if let Ok(store) = Arc::clone(store).downcast::<TableStore<E>>() {
                return Ok(store);
            }
        }

        let descriptor = self
            .descriptors
            .read()
            .get(&id)
            .and_then(|d| d.downcast_ref::<EntityDescriptor<E>>())
            .cloned()
            .ok_or_else(not_registered)?;

        let mut tables = self.tables.write();
        let store = tables.entry(id).or_insert_with(|| {
            let store: Erased = Arc::new(TableStore::new(
                Arc::clone(&self.document),
                descriptor,
                &self.config,
            ));
            store
        });
        Arc::clone(store)
            .downcast::<TableStore<E>>()
            .map_err(|_| not_registered())
    }

    /// A table store for an unregistered descriptor. Not cached.
    #[must_use]
    pub fn table_with<E: 'static>(&self, descriptor: EntityDescriptor<E>) -> TableStore<E> {
        TableStore::new(Arc::clone(&self.document), descriptor, &self.config)
    }

    /// Runs `f` against the loaded workbook.
    ///
    /// # Errors
    ///
    /// Fails if the workbook cannot be loaded.
    pub fn read_workbook<R>(&self, f: impl FnOnce(&Workbook) -> R) -> CoreResult<R> {
        let workbook = self.document.read()?;
        Ok(f(&workbook))
    }

    /// Names of every table (sheet) in workbook order.
    ///
    /// # Errors
    ///
    /// Fails if the workbook cannot be loaded.
    pub fn table_names(&self) -> CoreResult<Vec<String>> {
        self.read_workbook(|w| w.sheet_names().into_iter().map(str::to_string).collect())
    }

    /// Writes the whole workbook to storage.
    ///
    /// # Errors
    ///
    /// Fails if the workbook cannot be encoded or written.
    pub fn save(&self) -> CoreResult<()> {
        let workbook = self.document.write()?;
        let flush = self.document.snapshot(&workbook)?;
        drop(workbook);
        flush.run()
    }

    /// Whether the workbook is currently held in memory.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.document.is_loaded()
    }

    /// Drops the in-memory workbook without saving.
    ///
    /// Unsaved edits are lost. The next operation reloads from storage.
    pub fn close(&self) {
        self.document.close();
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("location", &self.document.location())
            .field("loaded", &self.document.is_loaded())
            .field("registered", &self.descriptors.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Pet {
        id: i64,
        name: String,
    }

    #[derive(Debug, Default)]
    struct Unregistered;

    fn pet_descriptor() -> EntityDescriptor<Pet> {
        EntityDescriptor::<Pet>::builder("pets")
            .identity_key("id", |p: &Pet| p.id, |p, v| p.id = v)
            .column("name", |p: &Pet| p.name.clone(), |p, v| p.name = v)
            .build()
            .unwrap()
    }

    fn pet(name: &str) -> Pet {
        Pet {
            id: 0,
            name: name.to_string(),
        }
    }

    #[test]
    fn table_store_is_cached_per_type() {
        let db = Database::open_in_memory();
        db.register(pet_descriptor());
        assert!(db.is_registered::<Pet>());

        let a = db.table::<Pet>().unwrap();
        let b = db.table::<Pet>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn unregistered_type_fails() {
        let db = Database::open_in_memory();
        assert!(matches!(
            db.table::<Unregistered>(),
            Err(CoreError::EntityNotRegistered { .. })
        ));
    }

    #[test]
    fn close_discards_unsaved_state() {
        let db = Database::open_in_memory();
        db.register(pet_descriptor());
        let pets = db.table::<Pet>().unwrap();
        pets.create_table().unwrap();
        pets.add(pet("Rex")).unwrap();

        db.document.write().unwrap().add_sheet("scratch").unwrap();
        assert_eq!(db.table_names().unwrap(), vec!["pets", "scratch"]);

        db.close();
        assert!(!db.is_loaded());
        assert_eq!(db.table_names().unwrap(), vec!["pets"]);
        assert_eq!(pets.query().unwrap(), vec![Pet { id: 1, name: "Rex".into() }]);
    }

    #[test]
    fn table_with_builds_unregistered_store() {
        let db = Database::open_in_memory();
        let scratch = db.table_with(pet_descriptor().with_table("scratch"));
        assert!(!db.is_registered::<Pet>());
        assert!(scratch.create_table().unwrap());
        assert_eq!(db.table_names().unwrap(), vec!["scratch"]);
    }

    #[test]
    fn file_database_persists_across_handles() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("zoo.xlsx");

        {
            let db = Database::open(Config::for_path(&path)).unwrap();
            db.register(pet_descriptor());
            let pets = db.table::<Pet>().unwrap();
            pets.create_table().unwrap();
            pets.add_range(&mut [pet("Rex"), pet("Tom")]).unwrap();
        }

        let db = Database::open(Config::for_path(&path)).unwrap();
        assert_eq!(db.database_name().as_deref(), Some("zoo"));
        assert_eq!(db.table_names().unwrap(), vec!["pets"]);
        db.register(pet_descriptor());
        let names: Vec<String> = db
            .table::<Pet>()
            .unwrap()
            .query()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Rex", "Tom"]);
    }

    #[test]
    fn change_database_switches_files() {
        let dir = tempdir().unwrap();
        let mut db = Database::open(Config::for_path(dir.path().join("first.xlsx"))).unwrap();
        db.register(pet_descriptor());
        let pets = db.table::<Pet>().unwrap();
        pets.create_table().unwrap();
        pets.add(pet("Rex")).unwrap();

        db.change_database("second").unwrap();
        assert_eq!(db.database_name().as_deref(), Some("second"));
        assert!(db.table_names().unwrap().is_empty());
        assert!(!db.table::<Pet>().unwrap().table_exists().unwrap());
        assert!(dir.path().join("first.xlsx").exists());
    }

    #[test]
    fn in_memory_database_cannot_change() {
        let mut db = Database::open_in_memory();
        assert!(db.change_database("other").is_err());
    }

    #[test]
    fn open_without_path_fails() {
        assert!(matches!(
            Database::open(Config::new()),
            Err(CoreError::Storage(_))
        ));
    }
}
