//! Runs against a real server when `SIMPLIFIED_TEST_DATABASE_URL` is set; otherwise each
//! test returns immediately.

use serde_json::json;
use simplified::config::DatabaseConfig;
use simplified::query::{InsertOutcome, SelectQuery};
use simplified::{
    ColumnDefinition, Condition, ContentStore, Predicate, Registry, TableNaming, TableSchema, db,
};

fn database_url() -> Option<String> {
    std::env::var("SIMPLIFIED_TEST_DATABASE_URL").ok()
}

fn row(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().unwrap().clone()
}

// A single test: the database actor is registered under a fixed name.
#[tokio::test]
async fn lifecycle_against_live_server() {
    let Some(url) = database_url() else {
        return;
    };

    let config = DatabaseConfig {
        prefix: format!("it{}_", chrono::Utc::now().timestamp()),
        ..DatabaseConfig::default()
    };
    let handle = db::spawn(&config, &url).await.unwrap();
    let store = ContentStore::new(
        handle,
        Registry::builder().build(),
        TableNaming::from_config(&config),
    );

    store.install_core_tables().await.unwrap();
    store.install_core_tables().await.unwrap();

    let schema = TableSchema::new()
        .with_column("ID", ColumnDefinition::bigint().primary().auto_increment())
        .with_column("name", ColumnDefinition::string(60).required())
        .with_column("tags", ColumnDefinition::array())
        .with_column("active", ColumnDefinition::boolean());
    store.create_table("people", &schema).await.unwrap();

    let InsertOutcome::Id(first) = store
        .insert("people", row(json!({"name": "Ann", "tags": ["a"], "active": true})))
        .await
        .unwrap()
    else {
        panic!("expected a generated id");
    };
    let InsertOutcome::Id(second) = store
        .insert("people", row(json!({"name": "Bob"})))
        .await
        .unwrap()
    else {
        panic!("expected a generated id");
    };

    // SUM over an integer column comes back as DECIMAL.
    let totals = store
        .raw_query(db::Statement::new(format!(
            "SELECT SUM(`ID`) AS `total` FROM {}",
            store.naming().quoted("people")
        )))
        .await
        .unwrap();
    assert_eq!(totals[0]["total"], json!((first + second).to_string()));

    let found = store
        .get_row(&SelectQuery::new("people").filter(Condition::eq("ID", first)))
        .await
        .unwrap();
    assert_eq!(found["tags"], json!(["a"]));
    assert_eq!(found["active"], json!(true));

    let both = Condition::parse(&json!({"name": {"$in": ["Ann", "Bob"]}})).unwrap();
    let count = store
        .get(&SelectQuery::new("people").filter(both.clone()).count())
        .await
        .unwrap();
    assert_eq!(count.count(), Some(2));

    let none = Condition::from(Predicate::is_in("name", Vec::<String>::new()));
    let empty = store.get(&SelectQuery::new("people").filter(none)).await.unwrap();
    assert!(empty.rows().is_empty());

    let updated = store
        .update("people", row(json!({"name": "Nobody"})), &Condition::eq("ID", 0))
        .await
        .unwrap();
    assert_eq!(updated, 0);

    store
        .reconcile(
            "people",
            &schema.clone().with_column("age", ColumnDefinition::int(3)),
        )
        .await
        .unwrap();
    store.rename_table("people", "persons").await.unwrap();

    let deleted = store.delete("persons", &both, None, None).await.unwrap();
    assert_eq!(deleted, 2);

    store.drop_table("persons").await.unwrap();
    for table in store.list_tables().await.unwrap() {
        store.drop_table(&table).await.unwrap();
    }
}
