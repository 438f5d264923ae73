mod common;

use common::{MemoryDb, row, store_with};
use serde_json::json;
use simplified::query::{InsertOutcome, JoinQuery, JoinTable, Order, QueryResult, SelectQuery};
use simplified::{ColumnDefinition, Condition, StoreError, TableSchema};

fn people() -> TableSchema {
    TableSchema::new()
        .with_column("ID", ColumnDefinition::bigint().primary().auto_increment())
        .with_column("name", ColumnDefinition::string(60).required())
        .with_column("age", ColumnDefinition::int(3).required())
        .with_column("tags", ColumnDefinition::array())
        .with_column("active", ColumnDefinition::boolean())
}

async fn setup() -> (MemoryDb, simplified::ContentStore<MemoryDb>) {
    let db = MemoryDb::new();
    let store = store_with(&db);
    store.create_table("people", &people()).await.unwrap();
    db.clear_log();
    (db, store)
}

#[tokio::test]
async fn insert_without_required_column_sends_no_sql() {
    let (db, store) = setup().await;

    let err = store
        .insert("people", row(json!({"name": "Ann"})))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(err.message(), "age is required");
    assert!(db.data_statements().is_empty());
}

#[tokio::test]
async fn insert_returns_generated_id() {
    let (db, store) = setup().await;

    let outcome = store
        .insert(
            "people",
            row(json!({"name": "Ann", "age": 30, "tags": ["a", "b"], "active": true, "x": 1})),
        )
        .await
        .unwrap();

    assert_eq!(outcome, InsertOutcome::Id(1));
    let insert = db.data_statements().pop().unwrap();
    assert_eq!(
        insert.sql,
        "INSERT INTO `people` (`name`, `age`, `tags`, `active`) VALUES (?, ?, ?, ?)"
    );
    assert_eq!(
        insert.params,
        vec![json!("Ann"), json!(30), json!(r#"["a","b"]"#), json!(1)]
    );
}

#[tokio::test]
async fn insert_into_table_without_auto_increment_reports_inserted() {
    let db = MemoryDb::new();
    let store = store_with(&db);
    let schema = TableSchema::new()
        .with_column("name", ColumnDefinition::string(200).required().primary())
        .with_column("value", ColumnDefinition::object());
    store.create_table("properties", &schema).await.unwrap();

    let outcome = store
        .insert("properties", row(json!({"name": "site", "value": {"title": "x"}})))
        .await
        .unwrap();
    assert_eq!(outcome, InsertOutcome::Inserted);
}

#[tokio::test]
async fn array_column_round_trips() {
    let (db, store) = setup().await;
    store
        .insert("people", row(json!({"name": "Ann", "age": 30, "tags": ["a", "b"]})))
        .await
        .unwrap();

    // What the backend hands back: the stored text and a SMALLINT flag.
    db.push_rows(json!([{"ID": 1, "name": "Ann", "age": 30, "tags": "[\"a\",\"b\"]", "active": 0}]));

    let result = store
        .get(&SelectQuery::new("people").filter(Condition::eq("ID", 1)))
        .await
        .unwrap();
    let rows = result.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["tags"], json!(["a", "b"]));
    assert_eq!(rows[0]["active"], json!(false));
}

#[tokio::test]
async fn select_sql_and_params() {
    let (db, store) = setup().await;
    let condition = Condition::parse(&json!({"age": {"$gt": 18}, "$or": [{"name": "a"}, {"name": "b"}]}))
        .unwrap();

    store
        .get(
            &SelectQuery::new("people")
                .columns(["ID", "name"])
                .filter(condition)
                .order_by("age", Order::Desc)
                .page(2, 5),
        )
        .await
        .unwrap();

    let select = db.data_statements().pop().unwrap();
    assert_eq!(
        select.sql,
        "SELECT `ID`, `name` FROM `people` WHERE `people`.`age` > ? \
         AND (`people`.`name` = ? OR `people`.`name` = ?) ORDER BY `age` DESC LIMIT 5, 5"
    );
    assert_eq!(select.params, vec![json!(18), json!("a"), json!("b")]);
}

#[tokio::test]
async fn count_returns_a_scalar() {
    let (db, store) = setup().await;
    db.push_rows(json!([{"count": 7}]));

    let result = store.get(&SelectQuery::new("people").count()).await.unwrap();
    assert_eq!(result, QueryResult::Count(7));
}

#[tokio::test]
async fn get_row_and_get_value() {
    let (db, store) = setup().await;
    let query = SelectQuery::new("people").filter(Condition::eq("name", "Ann"));

    db.push_rows(json!([{"ID": 4, "name": "Ann"}]));
    let found = store.get_row(&query).await.unwrap();
    assert_eq!(found["ID"], json!(4));
    assert!(db.data_statements().pop().unwrap().sql.ends_with("LIMIT 0, 1"));

    let missing = store.get_row(&query).await.unwrap_err();
    assert!(matches!(missing, StoreError::RowNotFound(_)));

    db.push_rows(json!([{"age": 41}]));
    assert_eq!(
        store.get_value(&query, "age", json!(0)).await.unwrap(),
        json!(41)
    );
    assert_eq!(
        store.get_value(&query, "age", json!(0)).await.unwrap(),
        json!(0)
    );
}

#[tokio::test]
async fn update_with_no_matching_rows_is_success() {
    let (db, store) = setup().await;
    db.set_rows_affected(0);

    let affected = store
        .update("people", row(json!({"age": 31})), &Condition::eq("ID", 999))
        .await
        .unwrap();
    assert_eq!(affected, 0);
}

#[tokio::test]
async fn update_and_delete_refuse_or_limit() {
    let (db, store) = setup().await;

    let err = store
        .update("people", row(json!({"age": 31})), &Condition::all())
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(db.data_statements().is_empty());

    store
        .delete("people", &Condition::eq("age", 3), None, Some(10))
        .await
        .unwrap();
    assert_eq!(
        db.data_statements().pop().unwrap().sql,
        "DELETE FROM `people` WHERE `people`.`age` = ? LIMIT 10"
    );
}

#[tokio::test]
async fn writes_invalidate_memoized_reads() {
    let (db, store) = setup().await;
    let query = SelectQuery::new("people").filter(Condition::eq("age", 30));

    db.push_rows(json!([{"ID": 1, "name": "Ann", "age": 30}]));
    let first = store.select_cached(&query).await.unwrap();
    assert_eq!(first.rows().len(), 1);

    // Served from memory: the backend has nothing queued and is not asked.
    let selects_before = db.data_statements().len();
    let again = store.select_cached(&query).await.unwrap();
    assert_eq!(again, first);
    assert_eq!(db.data_statements().len(), selects_before);

    store
        .update("people", row(json!({"name": "Bea"})), &Condition::eq("ID", 1))
        .await
        .unwrap();

    db.push_rows(json!([{"ID": 1, "name": "Bea", "age": 30}]));
    let fresh = store.select_cached(&query).await.unwrap();
    assert_eq!(fresh.rows()[0]["name"], json!("Bea"));
}

#[tokio::test]
async fn read_overlapping_a_write_is_not_memoized() {
    let (db, store) = setup().await;
    let query = SelectQuery::new("people").filter(Condition::eq("ID", 1));

    db.push_rows(json!([{"ID": 1, "name": "Ann", "age": 30}]));
    let mut held = db.hold_read("FROM `people`");
    let reader = {
        let store = store.clone();
        let query = query.clone();
        tokio::spawn(async move { store.select_cached(&query).await })
    };
    held.reached().await;

    store
        .update("people", row(json!({"name": "Bea"})), &Condition::eq("ID", 1))
        .await
        .unwrap();
    held.release();

    // The overlapping read still answers with what it saw.
    let stale = reader.await.unwrap().unwrap();
    assert_eq!(stale.rows()[0]["name"], json!("Ann"));

    db.push_rows(json!([{"ID": 1, "name": "Bea", "age": 30}]));
    let fresh = store.select_cached(&query).await.unwrap();
    assert_eq!(fresh.rows()[0]["name"], json!("Bea"));
}

#[tokio::test]
async fn reordered_conditions_share_one_memoized_read() {
    let (db, store) = setup().await;
    let a = SelectQuery::new("people")
        .filter(Condition::parse(&json!({"name": "Ann", "age": 30})).unwrap());
    let b = SelectQuery::new("people")
        .filter(Condition::parse(&json!({"age": 30, "name": "Ann"})).unwrap());

    db.push_rows(json!([{"ID": 1}]));
    store.select_cached(&a).await.unwrap();
    let count = db.data_statements().len();

    let hit = store.select_cached(&b).await.unwrap();
    assert_eq!(hit.rows()[0]["ID"], json!(1));
    assert_eq!(db.data_statements().len(), count);
}

#[tokio::test]
async fn left_join_filters_content_by_meta() {
    let (db, store) = setup().await;
    db.push_rows(json!([{"ID": 1, "name": "featured", "value": "1"}]));

    let rows = store
        .left_join(vec![
            JoinTable::new("news_content", "ID").filter(Condition::eq("status", "public")),
            JoinTable::new("news_meta", "contentId")
                .columns(["name", "value"])
                .filter(Condition::eq("name", "featured")),
        ])
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);

    let join = db.data_statements().pop().unwrap();
    assert_eq!(
        join.sql,
        "SELECT `news_content`.*, `news_meta`.`name`, `news_meta`.`value` FROM `news_content` \
         LEFT JOIN `news_meta` ON `news_content`.`ID` = `news_meta`.`contentId` \
         WHERE `news_content`.`status` = ? AND `news_meta`.`name` = ?"
    );
    assert_eq!(join.params, vec![json!("public"), json!("featured")]);
}

#[tokio::test]
async fn right_join_with_paging() {
    let (db, store) = setup().await;
    store
        .join(
            &JoinQuery::right(vec![JoinTable::new("a", "id"), JoinTable::new("b", "a_id")])
                .page(1, 20),
        )
        .await
        .unwrap();
    assert!(
        db.data_statements()
            .pop()
            .unwrap()
            .sql
            .ends_with("RIGHT JOIN `b` ON `a`.`id` = `b`.`a_id` LIMIT 0, 20")
    );
}
