//! Test fixtures and database helpers.
//!
//! Provides sample entity types, their descriptors and convenience
//! functions for setting up test databases.

use chrono::NaiveDateTime;
use sheetdb_core::{Config, Database, EntityDescriptor};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Sample entity with an identity key and one column of every common type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    /// Identity key, assigned on add.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Optional birth date.
    pub born: Option<NaiveDateTime>,
    /// Arbitrary score.
    pub score: f64,
    /// Whether the person is active.
    pub active: bool,
}

impl Person {
    /// Creates an unsaved person (id 0) with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the score.
    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    /// Sets the active flag.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Sets the birth date.
    #[must_use]
    pub fn with_born(mut self, born: NaiveDateTime) -> Self {
        self.born = Some(born);
        self
    }
}

/// Descriptor for [`Person`] on table `people`.
pub fn person_descriptor() -> EntityDescriptor<Person> {
    EntityDescriptor::<Person>::builder("people")
        .identity_key("id", |p: &Person| p.id, |p, v| p.id = v)
        .column("name", |p: &Person| p.name.clone(), |p, v| p.name = v)
        .column("born", |p: &Person| p.born, |p, v| p.born = v)
        .column("score", |p: &Person| p.score, |p, v| p.score = v)
        .column("active", |p: &Person| p.active, |p, v| p.active = v)
        .build()
        .expect("person descriptor is valid")
}

/// Sample entity with a caller-assigned text key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tag {
    /// Key.
    pub label: String,
    /// Usage count.
    pub uses: i64,
}

impl Tag {
    /// Creates a tag.
    pub fn new(label: impl Into<String>, uses: i64) -> Self {
        Self {
            label: label.into(),
            uses,
        }
    }
}

/// Descriptor for [`Tag`] on table `tags`, with the count stored in
/// column `Uses`.
pub fn tag_descriptor() -> EntityDescriptor<Tag> {
    EntityDescriptor::<Tag>::builder("tags")
        .key("label", |t: &Tag| t.label.clone(), |t, v| t.label = v)
        .column_as("uses", "Uses", |t: &Tag| t.uses, |t, v| t.uses = v)
        .build()
        .expect("tag descriptor is valid")
}

/// A test database with automatic cleanup.
///
/// [`Person`] and [`Tag`] are registered on every handle it creates.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestDatabase {
    /// Creates a new in-memory test database.
    pub fn memory() -> Self {
        Self {
            db: registered(Database::open_in_memory()),
            temp_dir: None,
        }
    }

    /// Creates a new file-based test database in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("test.xlsx");
        let db = Database::open(Config::for_path(&path)).expect("Failed to open file database");

        Self {
            db: registered(db),
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the workbook path if file-based, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self.temp_dir.as_ref().map(|d| d.path().join("test.xlsx"))
    }

    /// Opens a second, independent handle on the same workbook file.
    ///
    /// # Panics
    ///
    /// Panics for in-memory databases.
    pub fn reopen(&self) -> Database {
        let path = self.path().expect("Only file databases can be reopened");
        registered(Database::open(Config::for_path(path)).expect("Failed to reopen database"))
    }
}

fn registered(db: Database) -> Database {
    db.register(person_descriptor());
    db.register(tag_descriptor());
    db
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

impl std::ops::DerefMut for TestDatabase {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.db
    }
}

/// Runs a test with a temporary in-memory database.
///
/// # Example
///
/// ```rust
/// use sheetdb_testkit::{with_temp_db, Person};
///
/// with_temp_db(|db| {
///     let people = db.table::<Person>().unwrap();
///     people.create_table().unwrap();
///     assert_eq!(people.add(Person::new("Ada")).unwrap().id, 1);
/// });
/// ```
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database) -> R,
{
    let test_db = TestDatabase::memory();
    f(&test_db.db)
}

/// Runs a test with a temporary file-based database.
pub fn with_file_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database, &Path) -> R,
{
    let test_db = TestDatabase::file();
    let path = test_db.path().expect("File database should have a path");
    f(&test_db.db, &path)
}

/// Runs a mutable test with a temporary file-based database.
pub fn with_file_db_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut Database) -> R,
{
    let mut test_db = TestDatabase::file();
    f(&mut test_db.db)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// A database whose `people` table holds `count` people named
    /// `person_0`, `person_1`, ... with ids 1 to `count`.
    pub fn people_database(count: usize) -> TestDatabase {
        let test_db = TestDatabase::memory();
        let people = test_db.db.table::<Person>().expect("Person is registered");
        people.create_table().expect("Failed to create table");

        let mut batch: Vec<Person> = (0..count)
            .map(|i| {
                Person::new(format!("person_{i}"))
                    .with_score(i as f64)
                    .with_active(i % 2 == 0)
            })
            .collect();
        people.add_range(&mut batch).expect("Failed to add people");

        test_db
    }

    /// A database whose `tags` table holds the given `(label, uses)` rows,
    /// duplicates included.
    pub fn tags_database(tags: &[(&str, i64)]) -> TestDatabase {
        let test_db = TestDatabase::memory();
        let store = test_db.db.table::<Tag>().expect("Tag is registered");
        store.create_table().expect("Failed to create table");

        let mut batch: Vec<Tag> = tags.iter().map(|(label, uses)| Tag::new(*label, *uses)).collect();
        store.add_range(&mut batch).expect("Failed to add tags");

        test_db
    }
}
