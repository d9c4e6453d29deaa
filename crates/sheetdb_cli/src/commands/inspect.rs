//! Inspect command implementation.

use crate::Format;
use serde::Serialize;
use sheetdb_core::{ColumnIndex, Config, Database};
use sheetdb_storage::{FileBackend, StorageBackend};
use std::path::Path;

/// Workbook inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Workbook path.
    pub path: String,
    /// Database name (file name without extension).
    pub database: String,
    /// File size in bytes.
    pub size: u64,
    /// Tables in workbook order.
    pub tables: Vec<TableInfo>,
}

/// Summary of a single table.
#[derive(Debug, Serialize)]
pub struct TableInfo {
    /// Table (sheet) name.
    pub name: String,
    /// Header columns in header order.
    pub columns: Vec<String>,
    /// Number of rows below the header.
    pub row_count: u32,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path)?;

    match format {
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Format::Text => print_text_output(&result),
    }

    Ok(())
}

/// Collects table statistics for the workbook at `path`.
pub fn inspect(path: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No workbook found at {}", path.display()).into());
    }

    let size = FileBackend::open(path)?.size()?;
    let db = Database::open(Config::for_path(path).create_dirs(false))?;

    let tables = db.read_workbook(|workbook| {
        workbook
            .sheets()
            .map(|sheet| TableInfo {
                name: sheet.name().to_string(),
                columns: ColumnIndex::build(Some(sheet))
                    .iter()
                    .map(|(_, name)| name.to_string())
                    .collect(),
                row_count: sheet.last_row().saturating_sub(1),
            })
            .collect::<Vec<_>>()
    })?;
    tracing::debug!(path = %path.display(), tables = tables.len(), "workbook inspected");

    Ok(InspectResult {
        path: path.display().to_string(),
        database: db.database_name().unwrap_or_default(),
        size,
        tables,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("sheetdb Workbook Inspection");
    println!("===========================");
    println!();
    println!("Path:     {}", result.path);
    println!("Database: {}", result.database);
    println!("Size:     {} bytes", format_size(result.size));
    println!();

    if result.tables.is_empty() {
        println!("No tables.");
        return;
    }

    println!("Tables:");
    for table in &result.tables {
        println!("  {} ({} rows)", table.name, table.row_count);
        if !table.columns.is_empty() {
            println!("    columns: {}", table.columns.join(", "));
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes}")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetdb_core::EntityDescriptor;
    use tempfile::tempdir;

    #[derive(Debug, Default, Clone)]
    struct Book {
        id: i64,
        title: String,
    }

    fn books() -> EntityDescriptor<Book> {
        EntityDescriptor::<Book>::builder("books")
            .identity_key("id", |b: &Book| b.id, |b, v| b.id = v)
            .column("title", |b: &Book| b.title.clone(), |b, v| b.title = v)
            .build()
            .unwrap()
    }

    #[test]
    fn inspect_reports_tables() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("library.xlsx");
        {
            let db = Database::open(Config::for_path(&path)).unwrap();
            let store = db.table_with(books());
            store.create_table().unwrap();
            store
                .add_range(&mut [
                    Book { id: 0, title: "Dune".into() },
                    Book { id: 0, title: "Emma".into() },
                ])
                .unwrap();
        }

        let result = inspect(&path).unwrap();
        assert_eq!(result.database, "library");
        assert!(result.size > 0);
        assert_eq!(result.tables.len(), 1);
        assert_eq!(result.tables[0].name, "books");
        assert_eq!(result.tables[0].columns, vec!["id", "title"]);
        assert_eq!(result.tables[0].row_count, 2);
    }

    #[test]
    fn inspect_missing_file_fails() {
        let dir = tempdir().unwrap();
        assert!(inspect(&dir.path().join("absent.xlsx")).is_err());
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
