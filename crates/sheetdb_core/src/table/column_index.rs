//! Header row → column position map.

use sheetdb_codec::{CellValue, Worksheet};
use std::collections::HashMap;

/// Maps header names to their 1-based column positions.
///
/// Built by scanning row 1 left to right. The first occurrence of a name
/// wins; blank header cells are skipped. Names are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnIndex {
    positions: HashMap<String, u32>,
    names: Vec<(u32, String)>,
}

impl ColumnIndex {
    /// Scans the header row of `sheet`. An absent sheet yields an empty index.
    #[must_use]
    pub fn build(sheet: Option<&Worksheet>) -> Self {
        let mut index = Self::default();
        let Some(sheet) = sheet else {
            return index;
        };
        for column in 1..=sheet.last_column() {
            let name = match sheet.get(1, column) {
                CellValue::Empty => continue,
                CellValue::Text(s) => s.clone(),
                other => other.to_string(),
            };
            if name.trim().is_empty() || index.positions.contains_key(&name) {
                continue;
            }
            index.positions.insert(name.clone(), column);
            index.names.push((column, name));
        }
        tracing::trace!(sheet = sheet.name(), columns = index.len(), "column index rebuilt");
        index
    }

    /// Position of a column.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<u32> {
        self.positions.get(name).copied()
    }

    /// Whether a column exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Number of registered columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no column is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Registered `(position, name)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.names.iter().map(|(p, n)| (*p, n.as_str()))
    }
}
