//! Workbook files written by one handle and read by another.

use chrono::NaiveDate;
use proptest::prelude::*;
use sheetdb_codec::{encode_workbook, CellValue, Workbook};
use sheetdb_core::{Config, CoreError, Database};
use sheetdb_testkit::prelude::*;
use std::path::Path;

fn write_workbook(path: &Path, build: impl FnOnce(&mut Workbook)) {
    let mut workbook = Workbook::new();
    build(&mut workbook);
    std::fs::write(path, encode_workbook(&workbook).unwrap()).unwrap();
}

fn row(sheet: &mut sheetdb_codec::Worksheet, row: u32, values: &[CellValue]) {
    for (i, value) in values.iter().enumerate() {
        sheet.set(row, i as u32 + 1, value.clone()).unwrap();
    }
}

fn open(path: &Path) -> Database {
    let db = Database::open(Config::for_path(path)).unwrap();
    db.register(person_descriptor());
    db.register(tag_descriptor());
    db
}

#[test]
fn every_column_type_survives_a_reopen() {
    let test_db = TestDatabase::file();
    let born = NaiveDate::from_ymd_opt(1990, 6, 15)
        .unwrap()
        .and_hms_opt(8, 30, 0)
        .unwrap();
    let mut batch = vec![
        Person::new("Ada").with_born(born).with_score(97.5).with_active(true),
        Person::new("Brian").with_score(-3.0),
    ];
    let people = test_db.table::<Person>().unwrap();
    people.create_table().unwrap();
    people.add_range(&mut batch).unwrap();

    let reopened = test_db.reopen();
    assert_eq!(reopened.table::<Person>().unwrap().query().unwrap(), batch);
}

#[test]
fn close_discards_unsaved_schema_changes() {
    let test_db = TestDatabase::file();
    let narrow = test_db.table_with(
        sheetdb_core::EntityDescriptor::<Tag>::builder("tags")
            .key("label", |t: &Tag| t.label.clone(), |t, v| t.label = v)
            .build()
            .unwrap(),
    );
    narrow.create_table().unwrap();

    let tags = test_db.table::<Tag>().unwrap();
    assert_eq!(tags.ensure_columns().unwrap(), vec!["Uses"]);
    test_db.close();
    assert_eq!(tags.ensure_columns().unwrap(), vec!["Uses"]);

    tags.save().unwrap();
    test_db.close();
    assert!(tags.ensure_columns().unwrap().is_empty());
}

#[test]
fn mutations_persist_without_explicit_save() {
    let test_db = TestDatabase::file();
    let tags = test_db.table::<Tag>().unwrap();
    tags.create_table().unwrap();
    tags.add_range(&mut [Tag::new("a", 1), Tag::new("b", 2), Tag::new("c", 3)])
        .unwrap();
    tags.update(&Tag::new("b", 20)).unwrap();
    tags.delete_by_key("a").unwrap();

    let other = test_db.reopen();
    assert_eq!(
        other.table::<Tag>().unwrap().query().unwrap(),
        vec![Tag::new("b", 20), Tag::new("c", 3)]
    );
}

#[test]
fn foreign_columns_survive_updates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.xlsx");
    write_workbook(&path, |wb| {
        let sheet = wb.add_sheet("tags").unwrap();
        row(sheet, 1, &["label".into(), "notes".into(), "Uses".into()]);
        row(sheet, 2, &["x".into(), "keep me".into(), 1_i64.into()]);
    });

    let db = open(&path);
    let tags = db.table::<Tag>().unwrap();
    assert_eq!(tags.update(&Tag::new("x", 2)).unwrap(), 1);

    let db = open(&path);
    db.read_workbook(|wb| {
        let sheet = wb.sheet("tags").unwrap();
        assert_eq!(sheet.get(2, 2), &CellValue::from("keep me"));
        assert_eq!(sheet.get(2, 3).as_f64(), Some(2.0));
    })
    .unwrap();
}

#[test]
fn numeric_serials_read_as_dates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("serials.xlsx");
    write_workbook(&path, |wb| {
        let sheet = wb.add_sheet("people").unwrap();
        row(sheet, 1, &["id".into(), "name".into(), "born".into()]);
        row(sheet, 2, &[1_i64.into(), "Ada".into(), 45292.5.into()]);
    });

    let people = open(&path).table::<Person>().unwrap().query().unwrap();
    let expected = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    assert_eq!(people[0].born, Some(expected));
    assert_eq!(people[0].score, 0.0);
}

#[test]
fn unconvertible_cell_aborts_the_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.xlsx");
    write_workbook(&path, |wb| {
        let sheet = wb.add_sheet("people").unwrap();
        row(sheet, 1, &["id".into(), "name".into(), "score".into()]);
        row(sheet, 2, &[1_i64.into(), "Ada".into(), 1.5.into()]);
        row(sheet, 3, &[2_i64.into(), "Bob".into(), "lots".into()]);
    });

    let result = open(&path).table::<Person>().unwrap().query();
    match result {
        Err(CoreError::Conversion { row, column, .. }) => {
            assert_eq!(row, 3);
            assert_eq!(column, "score");
        }
        other => panic!("expected a conversion error, got {other:?}"),
    }
}

#[test]
fn missing_key_column_is_a_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keyless.xlsx");
    write_workbook(&path, |wb| {
        let sheet = wb.add_sheet("people").unwrap();
        row(sheet, 1, &["name".into()]);
        row(sheet, 2, &["Ada".into()]);
    });

    let people = open(&path).table::<Person>().unwrap();
    assert!(matches!(
        people.delete_by_key(1_i64),
        Err(CoreError::Schema { .. })
    ));
}

#[test]
fn table_names_match_case_insensitively() {
    with_file_db(|db, _| {
        let people = db.table::<Person>().unwrap();
        people.create_table().unwrap();
        let shouting = db.table_with(person_descriptor().with_table("PEOPLE"));
        assert!(shouting.table_exists().unwrap());
        assert!(!shouting.create_table().unwrap());
    });
}

#[test]
fn change_database_moves_to_a_sibling_file() {
    with_file_db_mut(|db| {
        let people = db.table::<Person>().unwrap();
        people.create_table().unwrap();
        people.add(Person::new("first")).unwrap();

        db.change_database("second").unwrap();
        assert_eq!(db.database_name().as_deref(), Some("second"));
        let people = db.table::<Person>().unwrap();
        assert!(!people.table_exists().unwrap());
        people.create_table().unwrap();
        people.add(Person::new("other")).unwrap();

        db.change_database("test").unwrap();
        let names: Vec<String> = db
            .table::<Person>()
            .unwrap()
            .query()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["first"]);
    });
}

#[test]
fn drop_table_persists() {
    let test_db = TestDatabase::file();
    let tags = test_db.table::<Tag>().unwrap();
    tags.create_table().unwrap();
    assert!(tags.drop_table().unwrap());
    assert!(!tags.drop_table().unwrap());

    let other = test_db.reopen();
    assert!(other.table_names().unwrap().is_empty());
    assert!(other.table::<Tag>().unwrap().query().unwrap().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn batches_round_trip_through_the_file(batch in people_strategy(1, 8)) {
        let test_db = TestDatabase::file();
        let people = test_db.table::<Person>().unwrap();
        people.create_table().unwrap();
        let mut inserted = batch;
        people.add_range(&mut inserted).unwrap();

        let reopened = test_db.reopen();
        prop_assert_eq!(reopened.table::<Person>().unwrap().query().unwrap(), inserted);
    }
}
