//! Row ↔ entity conversion and full-table scans.

use super::column_index::ColumnIndex;
use crate::entity::{ColumnDescriptor, EntityDescriptor};
use crate::error::{CoreError, CoreResult};
use crate::types::ValueType;
use parking_lot::MappedRwLockReadGuard;
use sheetdb_codec::{CellValue, Worksheet};
use std::sync::Arc;

/// Raw value of a cell as seen by `column`.
///
/// Date/time columns go through the date-aware accessor so numeric serials
/// come back as timestamps; text that does not look like a serial is left
/// for the generic coercion.
pub(crate) fn read_cell<E>(
    sheet: &Worksheet,
    row: u32,
    position: u32,
    column: &ColumnDescriptor<E>,
) -> CellValue {
    if column.value_type() == ValueType::DateTime {
        if let Some(dt) = sheet.get_datetime(row, position) {
            return CellValue::DateTime(dt);
        }
    }
    sheet.get(row, position).clone()
}

/// Builds an entity from data row `row`.
///
/// Properties whose column is missing from `index` keep the constructor's
/// value.
pub(crate) fn materialize<E>(
    sheet: &Worksheet,
    index: &ColumnIndex,
    descriptor: &EntityDescriptor<E>,
    row: u32,
) -> CoreResult<E> {
    let mut entity = descriptor.new_entity()?;
    for column in descriptor.columns() {
        let Some(position) = index.get(column.column_name()) else {
            continue;
        };
        let raw = read_cell(sheet, row, position, column);
        column.set(&mut entity, &raw).map_err(|e| {
            CoreError::conversion(descriptor.table_name(), column.column_name(), row, e)
        })?;
    }
    Ok(entity)
}

/// Writes every property with a resolved column into row `row`.
pub(crate) fn serialize<E>(
    sheet: &mut Worksheet,
    index: &ColumnIndex,
    descriptor: &EntityDescriptor<E>,
    entity: &E,
    row: u32,
) -> CoreResult<()> {
    for column in descriptor.columns() {
        if let Some(position) = index.get(column.column_name()) {
            sheet.set(row, position, column.get(entity))?;
        }
    }
    Ok(())
}

/// Normalized key of data row `row`.
pub(crate) fn row_key<E>(
    sheet: &Worksheet,
    key_position: u32,
    descriptor: &EntityDescriptor<E>,
    row: u32,
) -> CoreResult<CellValue> {
    let key = descriptor.key();
    key.normalize(&read_cell(sheet, row, key_position, key))
        .map_err(|e| CoreError::conversion(descriptor.table_name(), key.column_name(), row, e))
}

/// Lazy scan over the data rows of one table.
///
/// Yields `(row, entity)` from row 2 to the last used row. Holds a read lock
/// on the document until dropped, so mutating the same database while a
/// scan is alive blocks. Stops after the first error.
pub struct RowScan<'a, E> {
    sheet: Option<MappedRwLockReadGuard<'a, Worksheet>>,
    index: Arc<ColumnIndex>,
    descriptor: EntityDescriptor<E>,
    next_row: u32,
    last_row: u32,
}

impl<'a, E> RowScan<'a, E> {
    pub(crate) fn new(
        sheet: Option<MappedRwLockReadGuard<'a, Worksheet>>,
        index: Arc<ColumnIndex>,
        descriptor: EntityDescriptor<E>,
    ) -> Self {
        let last_row = sheet.as_ref().map_or(0, |s| s.last_row());
        Self {
            sheet,
            index,
            descriptor,
            next_row: 2,
            last_row,
        }
    }

    /// Rows left to visit.
    #[must_use]
    pub fn remaining(&self) -> usize {
        (self.last_row + 1).saturating_sub(self.next_row) as usize
    }
}

impl<E> Iterator for RowScan<'_, E> {
    type Item = CoreResult<(u32, E)>;

    fn next(&mut self) -> Option<Self::Item> {
        let sheet = self.sheet.as_ref()?;
        if self.next_row > self.last_row {
            return None;
        }
        let row = self.next_row;
        self.next_row += 1;
        let item = materialize(sheet, &self.index, &self.descriptor, row);
        if item.is_err() {
            self.next_row = self.last_row + 1;
        }
        Some(item.map(|entity| (row, entity)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.sheet.is_none() {
            return (0, Some(0));
        }
        (0, Some(self.remaining()))
    }
}
