//! Async mutations against a file-backed workbook.

use sheetdb_testkit::prelude::*;

#[tokio::test]
async fn async_mutations_reach_the_file() {
    let test_db = TestDatabase::file();
    let people = test_db.table::<Person>().unwrap();

    assert!(people.create_table_async().await.unwrap());
    let ada = people.add_async(Person::new("Ada")).await.unwrap();
    assert_eq!(ada.id, 1);

    let mut batch = vec![Person::new("Bob"), Person::new("Cy"), Person::new("Di")];
    assert_eq!(people.add_range_async(&mut batch).await.unwrap(), 3);
    assert_eq!(batch.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2, 3, 4]);

    let renamed = Person { name: "Robert".into(), ..batch[0].clone() };
    assert_eq!(people.update_async(&renamed).await.unwrap(), 1);
    assert_eq!(people.update_range_async(&[batch[1].clone().with_score(2.5)]).await.unwrap(), 1);
    assert_eq!(people.delete_async(&ada).await.unwrap(), 1);
    assert_eq!(people.delete_by_key_async(4_i64).await.unwrap(), 1);

    let names: Vec<String> = test_db
        .reopen()
        .table::<Person>()
        .unwrap()
        .query()
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Robert", "Cy"]);
}

#[tokio::test]
async fn async_bulk_deletes_and_lifecycle() {
    let test_db = TestDatabase::file();
    let tags = test_db.table::<Tag>().unwrap();
    tags.create_table_async().await.unwrap();
    tags.add_range_async(&mut [Tag::new("a", 1), Tag::new("b", 2), Tag::new("c", 3)])
        .await
        .unwrap();

    assert_eq!(tags.delete_by_keys_async(["a", "c"]).await.unwrap(), 2);
    assert_eq!(tags.delete_range_async(&[Tag::new("b", 0)]).await.unwrap(), 1);
    assert_eq!(tags.count().unwrap(), 0);

    tags.add_async(Tag::new("d", 4)).await.unwrap();
    assert_eq!(tags.truncate_async().await.unwrap(), 1);

    tags.ensure_columns().unwrap();
    tags.save_async().await.unwrap();
    assert!(tags.drop_table_async().await.unwrap());
    assert!(test_db.reopen().table_names().unwrap().is_empty());
}
