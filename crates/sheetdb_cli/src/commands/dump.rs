//! Dump command implementation.

use crate::Format;
use serde_json::{Map, Number, Value};
use sheetdb_core::{CellValue, ColumnIndex, Config, CoreError, Database};
use std::path::Path;

/// Rows of one table, keyed by header name.
#[derive(Debug)]
pub struct DumpResult {
    /// Header columns in header order.
    pub columns: Vec<String>,
    /// One object per data row.
    pub rows: Vec<Map<String, Value>>,
}

/// Runs the dump command.
pub fn run(
    path: &Path,
    table: &str,
    limit: Option<usize>,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No workbook found at {}", path.display()).into());
    }
    let result = dump(path, table, limit)?;

    match format {
        Format::Json => {
            let rows: Vec<Value> = result.rows.into_iter().map(Value::Object).collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Format::Text => print_text_output(&result),
    }

    Ok(())
}

/// Reads up to `limit` data rows of `table`.
pub fn dump(path: &Path, table: &str, limit: Option<usize>) -> Result<DumpResult, CoreError> {
    let db = Database::open(Config::for_path(path).create_dirs(false))?;

    db.read_workbook(|workbook| {
        let sheet = workbook
            .sheet(table)
            .ok_or_else(|| CoreError::table_not_found(table))?;
        let index = ColumnIndex::build(Some(sheet));
        let limit = limit.unwrap_or(usize::MAX);

        let rows: Vec<Map<String, Value>> = (2..=sheet.last_row())
            .take(limit)
            .map(|row| {
                index
                    .iter()
                    .map(|(column, name)| (name.to_string(), to_json(sheet.get(row, column))))
                    .collect()
            })
            .collect();
        tracing::debug!(table, rows = rows.len(), "table dumped");

        Ok(DumpResult {
            columns: index.iter().map(|(_, name)| name.to_string()).collect(),
            rows,
        })
    })?
}

/// Converts one cell to JSON. Non-finite floats become `null`.
fn to_json(value: &CellValue) -> Value {
    match value {
        CellValue::Empty => Value::Null,
        CellValue::Bool(b) => Value::Bool(*b),
        CellValue::Int(i) => Value::Number((*i).into()),
        CellValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        CellValue::Text(s) => Value::String(s.clone()),
        CellValue::DateTime(_) => Value::String(value.to_string()),
    }
}

fn print_text_output(result: &DumpResult) {
    println!("{}", result.columns.join("\t"));
    for row in &result.rows {
        let line: Vec<String> = result
            .columns
            .iter()
            .map(|column| match row.get(column) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            })
            .collect();
        println!("{}", line.join("\t"));
    }
    println!();
    println!("{} rows", result.rows.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetdb_core::EntityDescriptor;
    use tempfile::tempdir;

    #[derive(Debug, Default, Clone)]
    struct Item {
        id: i64,
        name: String,
        price: f64,
        stocked: bool,
    }

    fn items() -> EntityDescriptor<Item> {
        EntityDescriptor::<Item>::builder("items")
            .identity_key("id", |i: &Item| i.id, |i, v| i.id = v)
            .column("name", |i: &Item| i.name.clone(), |i, v| i.name = v)
            .column("price", |i: &Item| i.price, |i, v| i.price = v)
            .column("stocked", |i: &Item| i.stocked, |i, v| i.stocked = v)
            .build()
            .unwrap()
    }

    fn item(name: &str, price: f64, stocked: bool) -> Item {
        Item {
            id: 0,
            name: name.to_string(),
            price,
            stocked,
        }
    }

    fn seeded(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("shop.xlsx");
        let db = Database::open(Config::for_path(&path)).unwrap();
        let store = db.table_with(items());
        store.create_table().unwrap();
        store
            .add_range(&mut [
                item("lamp", 12.5, true),
                item("desk", 80.0, false),
                item("chair", 45.25, true),
            ])
            .unwrap();
        path
    }

    #[test]
    fn dump_keys_rows_by_header() {
        let dir = tempdir().unwrap();
        let path = seeded(dir.path());

        let result = dump(&path, "items", None).unwrap();
        assert_eq!(result.columns, vec!["id", "name", "price", "stocked"]);
        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.rows[0]["name"], Value::from("lamp"));
        assert_eq!(result.rows[0]["price"], Value::from(12.5));
        assert_eq!(result.rows[1]["stocked"], Value::Bool(false));
    }

    #[test]
    fn dump_honours_limit() {
        let dir = tempdir().unwrap();
        let path = seeded(dir.path());

        let result = dump(&path, "items", Some(2)).unwrap();
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[1]["name"], Value::from("desk"));
    }

    #[test]
    fn dump_missing_table_fails() {
        let dir = tempdir().unwrap();
        let path = seeded(dir.path());

        assert!(matches!(
            dump(&path, "orders", None),
            Err(CoreError::TableNotFound { .. })
        ));
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(to_json(&CellValue::Float(f64::NAN)), Value::Null);
        assert_eq!(to_json(&CellValue::Empty), Value::Null);
        assert_eq!(to_json(&CellValue::Int(7)), Value::from(7));
    }
}
