//! Append-only schema evolution.

use super::column_index::ColumnIndex;
use crate::entity::EntityDescriptor;
use crate::error::CoreResult;
use sheetdb_codec::{CellValue, Worksheet};

/// Appends every descriptor column missing from `index` to the header row
/// of `sheet`, in descriptor order, starting after the last used column.
///
/// Returns the names appended; an empty list means the header already had
/// every column and nothing changed. The caller must drop `index`
/// afterwards if anything was appended.
pub(crate) fn append_missing_columns<E>(
    sheet: &mut Worksheet,
    index: &ColumnIndex,
    descriptor: &EntityDescriptor<E>,
) -> CoreResult<Vec<String>> {
    let missing: Vec<String> = descriptor
        .column_names()
        .filter(|name| !index.contains(name))
        .map(str::to_string)
        .collect();
    if missing.is_empty() {
        return Ok(missing);
    }

    let mut position = sheet.last_column();
    for name in &missing {
        position += 1;
        sheet.set(1, position, CellValue::Text(name.clone()))?;
    }
    tracing::debug!(
        table = descriptor.table_name(),
        appended = ?missing,
        "schema evolved"
    );
    Ok(missing)
}

/// Writes the full header row of a freshly created sheet.
pub(crate) fn write_header<E>(sheet: &mut Worksheet, descriptor: &EntityDescriptor<E>) -> CoreResult<()> {
    for (position, name) in (1..).zip(descriptor.column_names()) {
        sheet.set(1, position, CellValue::from(name))?;
    }
    Ok(())
}
