//! Typed CRUD over one table.

use super::column_index::ColumnIndex;
use super::identity::allocate_identities;
use super::rows::{row_key, serialize, RowScan};
use super::schema::{append_missing_columns, write_header};
use crate::config::Config;
use crate::document::{Document, PendingFlush};
use crate::entity::EntityDescriptor;
use crate::error::{CoreError, CoreResult};
use crate::filter::{DefaultFilterService, FilterRule, FilterService, Predicate};
use crate::types::ValueType;
use parking_lot::{MappedRwLockReadGuard, Mutex, RwLock};
use sheetdb_codec::{CellValue, Workbook, Worksheet};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

struct CachedIndex {
    generation: u64,
    table: String,
    index: Arc<ColumnIndex>,
}

/// Result of an in-memory edit plus the flush it requires, if any.
struct Edit<T> {
    value: T,
    flush: Option<PendingFlush>,
}

impl<T> Edit<T> {
    fn saved(value: T, flush: PendingFlush) -> Self {
        Self {
            value,
            flush: Some(flush),
        }
    }

    fn unchanged(value: T) -> Self {
        Self { value, flush: None }
    }

    fn finish(self) -> CoreResult<T> {
        if let Some(flush) = self.flush {
            flush.run()?;
        }
        Ok(self.value)
    }

    #[cfg(feature = "async")]
    async fn finish_async(self) -> CoreResult<T> {
        if let Some(flush) = self.flush {
            flush.run_async().await?;
        }
        Ok(self.value)
    }
}

fn sheet_mut<'w>(workbook: &'w mut Workbook, table: &str) -> CoreResult<&'w mut Worksheet> {
    workbook
        .sheet_mut(table)
        .ok_or_else(|| CoreError::table_not_found(table))
}

/// A table of entities of type `E`.
///
/// Every mutating call edits the in-memory workbook and then writes the
/// whole document back to storage. Reads always rescan the sheet; nothing
/// is cached across calls except the header column index.
///
/// Mutations on a table that does not exist fail with
/// [`CoreError::TableNotFound`]; reads of it are empty.
///
/// # Concurrency
///
/// Each call holds the document write lock while it edits, so calls on
/// one [`Database`](crate::Database) do not interleave. There is no
/// isolation between two handles opened on the same file: identity
/// allocation and key matching are read-then-write and can race.
///
/// # Example
///
/// ```
/// use sheetdb_core::{Database, EntityDescriptor};
///
/// #[derive(Debug, Default, Clone, PartialEq)]
/// struct Note {
///     id: i64,
///     text: String,
/// }
///
/// let db = Database::open_in_memory();
/// db.register(
///     EntityDescriptor::<Note>::builder("notes")
///         .identity_key("id", |n: &Note| n.id, |n, v| n.id = v)
///         .column("text", |n: &Note| n.text.clone(), |n, v| n.text = v)
///         .build()
///         .unwrap(),
/// );
///
/// let notes = db.table::<Note>().unwrap();
/// notes.create_table().unwrap();
/// let note = notes.add(Note { id: 0, text: "hello".into() }).unwrap();
/// assert_eq!(note.id, 1);
/// assert_eq!(notes.get(1_i64).unwrap(), Some(note));
/// ```
pub struct TableStore<E> {
    document: Arc<Document>,
    descriptor: RwLock<EntityDescriptor<E>>,
    date_time_format: RwLock<String>,
    date_column_width: f64,
    columns: Mutex<Option<CachedIndex>>,
}

impl<E: 'static> TableStore<E> {
    pub(crate) fn new(document: Arc<Document>, descriptor: EntityDescriptor<E>, config: &Config) -> Self {
        Self {
            document,
            descriptor: RwLock::new(descriptor),
            date_time_format: RwLock::new(config.date_time_format.clone()),
            date_column_width: config.date_column_width,
            columns: Mutex::new(None),
        }
    }

    /// Snapshot of the current descriptor.
    #[must_use]
    pub fn descriptor(&self) -> EntityDescriptor<E> {
        self.descriptor.read().clone()
    }

    /// Name of the table currently targeted.
    #[must_use]
    pub fn table_name(&self) -> String {
        self.descriptor.read().table_name().to_string()
    }

    /// Points this store at another table with the same layout.
    pub fn change_table(&self, table: impl Into<String>) -> EntityDescriptor<E> {
        let mut descriptor = self.descriptor.write();
        *descriptor = descriptor.with_table(table);
        self.invalidate();
        debug!(table = descriptor.table_name(), "table redirected");
        descriptor.clone()
    }

    /// Points this store back at the table its descriptor was built for.
    pub fn change_table_back(&self) -> EntityDescriptor<E> {
        let mut descriptor = self.descriptor.write();
        *descriptor = descriptor.origin();
        self.invalidate();
        descriptor.clone()
    }

    fn invalidate(&self) {
        *self.columns.lock() = None;
    }

    fn column_index(&self, sheet: &Worksheet, table: &str) -> Arc<ColumnIndex> {
        let generation = self.document.generation();
        let mut cache = self.columns.lock();
        if let Some(cached) = cache.as_ref() {
            if cached.generation == generation && cached.table == table {
                return Arc::clone(&cached.index);
            }
        }
        let index = Arc::new(ColumnIndex::build(Some(sheet)));
        *cache = Some(CachedIndex {
            generation,
            table: table.to_string(),
            index: Arc::clone(&index),
        });
        index
    }

    fn apply_date_format(&self, sheet: &mut Worksheet, index: &ColumnIndex, descriptor: &EntityDescriptor<E>) {
        let format = self.date_time_format.read();
        for column in descriptor.columns() {
            if column.value_type() != ValueType::DateTime {
                continue;
            }
            if let Some(position) = index.get(column.column_name()) {
                sheet.set_column_format(position, format.as_str());
                sheet.set_column_width(position, self.date_column_width);
            }
        }
    }

    fn ensure_columns_in(
        &self,
        sheet: &mut Worksheet,
        descriptor: &EntityDescriptor<E>,
    ) -> CoreResult<(Arc<ColumnIndex>, Vec<String>)> {
        let table = descriptor.table_name();
        let index = self.column_index(sheet, table);
        let appended = append_missing_columns(sheet, &index, descriptor)?;
        if appended.is_empty() {
            return Ok((index, appended));
        }
        self.document.touch();
        let index = self.column_index(sheet, table);
        self.apply_date_format(sheet, &index, descriptor);
        Ok((index, appended))
    }

    // Schema

    /// Whether the table's sheet exists.
    ///
    /// # Errors
    ///
    /// Fails if the document cannot be loaded.
    pub fn table_exists(&self) -> CoreResult<bool> {
        let table = self.table_name();
        Ok(self.document.read()?.sheet(&table).is_some())
    }

    /// Appends any mapped column missing from the header.
    ///
    /// Returns the names appended. The change is not persisted until the
    /// next mutation or [`TableStore::save`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TableNotFound`] if the table does not exist.
    pub fn ensure_columns(&self) -> CoreResult<Vec<String>> {
        let descriptor = self.descriptor();
        let mut workbook = self.document.write()?;
        let sheet = sheet_mut(&mut workbook, descriptor.table_name())?;
        let (_, appended) = self.ensure_columns_in(sheet, &descriptor)?;
        Ok(appended)
    }

    /// Sets the number format of the table's date/time columns.
    ///
    /// Also used for date/time columns created later by this store. Not
    /// persisted until the next mutation or [`TableStore::save`].
    ///
    /// # Errors
    ///
    /// Fails if the document cannot be loaded.
    pub fn set_date_time_format(&self, format: impl Into<String>) -> CoreResult<()> {
        *self.date_time_format.write() = format.into();
        let descriptor = self.descriptor();
        let mut workbook = self.document.write()?;
        if let Some(sheet) = workbook.sheet_mut(descriptor.table_name()) {
            let index = self.column_index(sheet, descriptor.table_name());
            self.apply_date_format(sheet, &index, &descriptor);
        }
        Ok(())
    }

    /// Writes the whole document to storage.
    ///
    /// # Errors
    ///
    /// Fails if the document cannot be encoded or written.
    pub fn save(&self) -> CoreResult<()> {
        let workbook = self.document.write()?;
        let flush = self.document.snapshot(&workbook)?;
        drop(workbook);
        flush.run()
    }

    fn create_table_edit(&self) -> CoreResult<Edit<bool>> {
        let descriptor = self.descriptor();
        let table = descriptor.table_name();
        let mut workbook = self.document.write()?;
        if workbook.sheet(table).is_some() {
            return Ok(Edit::unchanged(false));
        }

        let sheet = workbook.add_sheet(table)?;
        write_header(sheet, &descriptor)?;
        self.document.touch();
        let index = self.column_index(sheet, table);
        self.apply_date_format(sheet, &index, &descriptor);
        info!(table, columns = index.len(), "table created");

        Ok(Edit::saved(true, self.document.snapshot(&workbook)?))
    }

    /// Creates the table with a header row of every mapped column.
    ///
    /// Returns `false` without touching storage if it already exists.
    ///
    /// # Errors
    ///
    /// Fails if the table name is not a valid sheet name or the document
    /// cannot be written.
    pub fn create_table(&self) -> CoreResult<bool> {
        self.create_table_edit()?.finish()
    }

    fn drop_table_edit(&self) -> CoreResult<Edit<bool>> {
        let table = self.table_name();
        let mut workbook = self.document.write()?;
        if !workbook.remove_sheet(&table) {
            return Ok(Edit::unchanged(false));
        }
        self.document.touch();
        info!(table = %table, "table dropped");
        Ok(Edit::saved(true, self.document.snapshot(&workbook)?))
    }

    /// Removes the table. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Fails if the document cannot be written.
    pub fn drop_table(&self) -> CoreResult<bool> {
        self.drop_table_edit()?.finish()
    }

    fn truncate_edit(&self) -> CoreResult<Edit<usize>> {
        let table = self.table_name();
        let mut workbook = self.document.write()?;
        let sheet = sheet_mut(&mut workbook, &table)?;
        let last_row = sheet.last_row();
        if last_row < 2 {
            return Ok(Edit::unchanged(0));
        }
        sheet.delete_rows(2, last_row - 1);
        let removed = (last_row - 1) as usize;
        info!(table = %table, rows = removed, "table truncated");
        Ok(Edit::saved(removed, self.document.snapshot(&workbook)?))
    }

    /// Deletes every data row, keeping the header.
    ///
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TableNotFound`] if the table does not exist.
    pub fn truncate(&self) -> CoreResult<usize> {
        self.truncate_edit()?.finish()
    }

    // Create

    fn add_range_edit(&self, entities: &mut [E]) -> CoreResult<Edit<usize>> {
        let descriptor = self.descriptor();
        let table = descriptor.table_name();
        let mut workbook = self.document.write()?;
        let sheet = sheet_mut(&mut workbook, table)?;
        let (index, _) = self.ensure_columns_in(sheet, &descriptor)?;

        if descriptor.is_identity() {
            allocate_identities(sheet, &index, &descriptor, entities)?;
        }

        let mut row = sheet.last_row();
        for entity in entities.iter() {
            row += 1;
            serialize(sheet, &index, &descriptor, entity, row)?;
        }
        debug!(table, rows = entities.len(), "rows added");

        Ok(Edit::saved(entities.len(), self.document.snapshot(&workbook)?))
    }

    /// Appends a batch of entities in order.
    ///
    /// Missing header columns are added first. For identity keys, entities
    /// whose key is empty or default get consecutive values after the
    /// current maximum, written back into the slice.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TableNotFound`] if the table does not exist.
    pub fn add_range(&self, entities: &mut [E]) -> CoreResult<usize> {
        self.add_range_edit(entities)?.finish()
    }

    /// Appends one entity and returns it with its key filled in.
    ///
    /// # Errors
    ///
    /// See [`TableStore::add_range`].
    pub fn add(&self, entity: E) -> CoreResult<E> {
        let mut batch = [entity];
        self.add_range(&mut batch)?;
        let [entity] = batch;
        Ok(entity)
    }

    // Retrieve

    /// Lazily materializes every data row, in row order.
    ///
    /// The scan keeps the document read-locked until it is dropped; finish
    /// or drop it before mutating the same database.
    ///
    /// # Errors
    ///
    /// Fails if the document cannot be loaded. Row conversion failures are
    /// yielded by the iterator.
    pub fn scan(&self) -> CoreResult<RowScan<'_, E>> {
        let descriptor = self.descriptor();
        let table = descriptor.table_name().to_string();
        let workbook = self.document.read()?;
        let sheet = MappedRwLockReadGuard::try_map(workbook, |w| w.sheet(&table)).ok();
        let index = match &sheet {
            Some(sheet) => self.column_index(sheet, &table),
            None => Arc::new(ColumnIndex::default()),
        };
        Ok(RowScan::new(sheet, index, descriptor))
    }

    /// Every entity in the table.
    ///
    /// # Errors
    ///
    /// Fails on the first row that cannot be materialized.
    pub fn query(&self) -> CoreResult<Vec<E>> {
        self.scan()?.map(|item| item.map(|(_, entity)| entity)).collect()
    }

    /// Entities matching `predicate`.
    ///
    /// # Errors
    ///
    /// Fails on the first row that cannot be materialized.
    pub fn filter(&self, predicate: &Predicate<E>) -> CoreResult<Vec<E>> {
        let mut matches = Vec::new();
        for item in self.scan()? {
            let (_, entity) = item?;
            if predicate.matches(&entity) {
                matches.push(entity);
            }
        }
        Ok(matches)
    }

    /// Entities matching `rule`, compiled by [`DefaultFilterService`].
    ///
    /// # Errors
    ///
    /// Fails if the rule does not apply to the entity or a row cannot be
    /// materialized.
    pub fn query_where(&self, rule: &FilterRule) -> CoreResult<Vec<E>> {
        self.query_with(&DefaultFilterService, rule)
    }

    /// Entities matching `rule`, compiled by `service`.
    ///
    /// # Errors
    ///
    /// See [`TableStore::query_where`].
    pub fn query_with<S: FilterService>(&self, service: &S, rule: &FilterRule) -> CoreResult<Vec<E>> {
        let predicate = service.compile(rule, &self.descriptor())?;
        self.filter(&predicate)
    }

    /// First entity whose key equals `key`.
    ///
    /// # Errors
    ///
    /// Fails if `key` cannot be converted to the key type or a row cannot
    /// be materialized.
    pub fn get(&self, key: impl Into<CellValue>) -> CoreResult<Option<E>> {
        let predicate = self.key_predicate(key)?;
        for item in self.scan()? {
            let (_, entity) = item?;
            if predicate.matches(&entity) {
                return Ok(Some(entity));
            }
        }
        Ok(None)
    }

    /// Number of data rows.
    ///
    /// # Errors
    ///
    /// Fails if the document cannot be loaded.
    pub fn count(&self) -> CoreResult<usize> {
        let table = self.table_name();
        let workbook = self.document.read()?;
        Ok(workbook
            .sheet(&table)
            .map_or(0, |s| s.last_row().saturating_sub(1) as usize))
    }

    /// Predicate `key = value`.
    ///
    /// # Errors
    ///
    /// Fails if `key` cannot be converted to the key type.
    pub fn key_predicate(&self, key: impl Into<CellValue>) -> CoreResult<Predicate<E>> {
        let descriptor = self.descriptor();
        let rule = FilterRule::eq(descriptor.key().property(), key);
        DefaultFilterService.compile(&rule, &descriptor)
    }

    /// Predicate `key In values`.
    ///
    /// # Errors
    ///
    /// Fails if a key cannot be converted to the key type.
    pub fn keys_predicate<I, K>(&self, keys: I) -> CoreResult<Predicate<E>>
    where
        I: IntoIterator<Item = K>,
        K: Into<CellValue>,
    {
        let descriptor = self.descriptor();
        let rule = FilterRule::is_in(descriptor.key().property(), keys);
        DefaultFilterService.compile(&rule, &descriptor)
    }

    // Update

    fn update_edit(&self, entity: &E) -> CoreResult<Edit<usize>> {
        let descriptor = self.descriptor();
        let table = descriptor.table_name();
        let mut workbook = self.document.write()?;
        let sheet = sheet_mut(&mut workbook, table)?;
        let (index, _) = self.ensure_columns_in(sheet, &descriptor)?;
        let key_position = key_position(&index, &descriptor)?;

        let key = descriptor.key().get(entity);
        let mut updated = 0;
        for row in 2..=sheet.last_row() {
            if row_key(sheet, key_position, &descriptor, row)? == key {
                serialize(sheet, &index, &descriptor, entity, row)?;
                updated = 1;
                break;
            }
        }
        debug!(table, rows = updated, "rows updated");

        Ok(Edit::saved(updated, self.document.snapshot(&workbook)?))
    }

    /// Overwrites the first row whose key equals the entity's key.
    ///
    /// Later rows with the same key are left alone, unlike
    /// [`TableStore::update_range`]. Returns 0 or 1.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TableNotFound`] if the table does not exist.
    pub fn update(&self, entity: &E) -> CoreResult<usize> {
        self.update_edit(entity)?.finish()
    }

    fn update_range_edit(&self, entities: &[E]) -> CoreResult<Edit<usize>> {
        let descriptor = self.descriptor();
        let table = descriptor.table_name();
        let key = descriptor.key();
        let mut workbook = self.document.write()?;
        let sheet = sheet_mut(&mut workbook, table)?;
        let (index, _) = self.ensure_columns_in(sheet, &descriptor)?;
        let key_position = key_position(&index, &descriptor)?;

        // Later entries replace earlier ones with the same key.
        let by_key: HashMap<CellValue, &E> = entities.iter().map(|e| (key.get(e), e)).collect();

        let mut updated = 0;
        for row in 2..=sheet.last_row() {
            let current = row_key(sheet, key_position, &descriptor, row)?;
            if let Some(entity) = by_key.get(&current) {
                serialize(sheet, &index, &descriptor, *entity, row)?;
                updated += 1;
            }
        }
        debug!(table, rows = updated, "rows updated");

        Ok(Edit::saved(updated, self.document.snapshot(&workbook)?))
    }

    /// Overwrites every row whose key matches one of the entities.
    ///
    /// If the input repeats a key the last entity wins. If the table
    /// repeats a key every matching row is overwritten. Returns the number
    /// of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TableNotFound`] if the table does not exist.
    pub fn update_range(&self, entities: &[E]) -> CoreResult<usize> {
        self.update_range_edit(entities)?.finish()
    }

    // Delete

    fn delete_by_keys_edit(&self, keys: Vec<CellValue>) -> CoreResult<Edit<usize>> {
        let descriptor = self.descriptor();
        let table = descriptor.table_name();
        let key = descriptor.key();
        let wanted = keys
            .iter()
            .map(|k| {
                key.normalize(k)
                    .map_err(|e| CoreError::conversion(table, key.column_name(), 0, e))
            })
            .collect::<CoreResult<HashSet<_>>>()?;

        let mut workbook = self.document.write()?;
        let sheet = sheet_mut(&mut workbook, table)?;
        let index = self.column_index(sheet, table);
        let key_position = key_position(&index, &descriptor)?;

        let mut doomed = Vec::new();
        for row in 2..=sheet.last_row() {
            if wanted.contains(&row_key(sheet, key_position, &descriptor, row)?) {
                doomed.push(row);
            }
        }
        let deleted = doomed.len();
        sheet.delete_row_set(doomed);
        debug!(table, rows = deleted, "rows deleted");

        Ok(Edit::saved(deleted, self.document.snapshot(&workbook)?))
    }

    fn keys_of(&self, entities: &[E]) -> Vec<CellValue> {
        let descriptor = self.descriptor.read();
        entities.iter().map(|e| descriptor.key().get(e)).collect()
    }

    /// Deletes every row whose key is in `keys`.
    ///
    /// Keys are converted to the key type first, so `"5"` deletes an
    /// integer key 5. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TableNotFound`] if the table does not exist,
    /// [`CoreError::Schema`] if the key column is missing from the header.
    pub fn delete_by_keys<I, K>(&self, keys: I) -> CoreResult<usize>
    where
        I: IntoIterator<Item = K>,
        K: Into<CellValue>,
    {
        self.delete_by_keys_edit(keys.into_iter().map(Into::into).collect())?
            .finish()
    }

    /// Deletes every row whose key equals `key`.
    ///
    /// # Errors
    ///
    /// See [`TableStore::delete_by_keys`].
    pub fn delete_by_key(&self, key: impl Into<CellValue>) -> CoreResult<usize> {
        self.delete_by_keys_edit(vec![key.into()])?.finish()
    }

    /// Deletes the rows sharing the entity's key.
    ///
    /// # Errors
    ///
    /// See [`TableStore::delete_by_keys`].
    pub fn delete(&self, entity: &E) -> CoreResult<usize> {
        self.delete_by_keys_edit(self.keys_of(std::slice::from_ref(entity)))?
            .finish()
    }

    /// Deletes the rows sharing any of the entities' keys.
    ///
    /// # Errors
    ///
    /// See [`TableStore::delete_by_keys`].
    pub fn delete_range(&self, entities: &[E]) -> CoreResult<usize> {
        self.delete_by_keys_edit(self.keys_of(entities))?.finish()
    }
}

/// Async twins of the mutating operations.
///
/// The in-memory edit runs on the calling task; only the write to storage
/// is moved to the blocking thread pool.
#[cfg(feature = "async")]
impl<E: 'static> TableStore<E> {
    /// Async [`TableStore::create_table`].
    ///
    /// # Errors
    ///
    /// See [`TableStore::create_table`].
    pub async fn create_table_async(&self) -> CoreResult<bool> {
        self.create_table_edit()?.finish_async().await
    }

    /// Async [`TableStore::drop_table`].
    ///
    /// # Errors
    ///
    /// See [`TableStore::drop_table`].
    pub async fn drop_table_async(&self) -> CoreResult<bool> {
        self.drop_table_edit()?.finish_async().await
    }

    /// Async [`TableStore::truncate`].
    ///
    /// # Errors
    ///
    /// See [`TableStore::truncate`].
    pub async fn truncate_async(&self) -> CoreResult<usize> {
        self.truncate_edit()?.finish_async().await
    }

    /// Async [`TableStore::add`].
    ///
    /// # Errors
    ///
    /// See [`TableStore::add_range`].
    pub async fn add_async(&self, entity: E) -> CoreResult<E> {
        let mut batch = [entity];
        self.add_range_edit(&mut batch)?.finish_async().await?;
        let [entity] = batch;
        Ok(entity)
    }

    /// Async [`TableStore::add_range`].
    ///
    /// # Errors
    ///
    /// See [`TableStore::add_range`].
    pub async fn add_range_async(&self, entities: &mut [E]) -> CoreResult<usize> {
        self.add_range_edit(entities)?.finish_async().await
    }

    /// Async [`TableStore::update`].
    ///
    /// # Errors
    ///
    /// See [`TableStore::update`].
    pub async fn update_async(&self, entity: &E) -> CoreResult<usize> {
        self.update_edit(entity)?.finish_async().await
    }

    /// Async [`TableStore::update_range`].
    ///
    /// # Errors
    ///
    /// See [`TableStore::update_range`].
    pub async fn update_range_async(&self, entities: &[E]) -> CoreResult<usize> {
        self.update_range_edit(entities)?.finish_async().await
    }

    /// Async [`TableStore::delete`].
    ///
    /// # Errors
    ///
    /// See [`TableStore::delete_by_keys`].
    pub async fn delete_async(&self, entity: &E) -> CoreResult<usize> {
        let keys = self.keys_of(std::slice::from_ref(entity));
        self.delete_by_keys_edit(keys)?.finish_async().await
    }

    /// Async [`TableStore::delete_range`].
    ///
    /// # Errors
    ///
    /// See [`TableStore::delete_by_keys`].
    pub async fn delete_range_async(&self, entities: &[E]) -> CoreResult<usize> {
        let keys = self.keys_of(entities);
        self.delete_by_keys_edit(keys)?.finish_async().await
    }

    /// Async [`TableStore::delete_by_key`].
    ///
    /// # Errors
    ///
    /// See [`TableStore::delete_by_keys`].
    pub async fn delete_by_key_async(&self, key: impl Into<CellValue>) -> CoreResult<usize> {
        self.delete_by_keys_edit(vec![key.into()])?
            .finish_async()
            .await
    }

    /// Async [`TableStore::delete_by_keys`].
    ///
    /// # Errors
    ///
    /// See [`TableStore::delete_by_keys`].
    pub async fn delete_by_keys_async<I, K>(&self, keys: I) -> CoreResult<usize>
    where
        I: IntoIterator<Item = K>,
        K: Into<CellValue>,
    {
        let keys = keys.into_iter().map(Into::into).collect();
        self.delete_by_keys_edit(keys)?.finish_async().await
    }

    /// Async [`TableStore::save`].
    ///
    /// # Errors
    ///
    /// See [`TableStore::save`].
    pub async fn save_async(&self) -> CoreResult<()> {
        let flush = {
            let workbook = self.document.write()?;
            self.document.snapshot(&workbook)?
        };
        flush.run_async().await
    }
}

fn key_position<E>(index: &ColumnIndex, descriptor: &EntityDescriptor<E>) -> CoreResult<u32> {
    let column = descriptor.key().column_name();
    index
        .get(column)
        .ok_or_else(|| CoreError::schema(descriptor.table_name(), column))
}
