use super::*;
use crate::config::PostgresConfig;
use crate::types::EventType;
use chrono::Utc;
use std::env;

fn create_test_postgres_config() -> PostgresConfig {
    PostgresConfig {
        host: env::var("RECO_PG_HOST").unwrap_or_else(|_| "localhost".to_string()),
        port: 5432,
        user: env::var("RECO_PG_USER").unwrap_or_else(|_| "reco".to_string()),
        password: env::var("RECO_PG_PASSWORD").unwrap_or_default(),
        database: env::var("RECO_PG_DATABASE").unwrap_or_else(|_| "reco".to_string()),
        max_connections: 5,
        connection_timeout_secs: 5,
    }
}

#[test]
fn test_schema_covers_all_three_tables() {
    let ddl = schema::STATEMENTS.join("\n");
    assert!(ddl.contains("CREATE TABLE IF NOT EXISTS items"));
    assert!(ddl.contains("CREATE TABLE IF NOT EXISTS events"));
    assert!(ddl.contains("CREATE TABLE IF NOT EXISTS models"));
}

#[test]
fn test_items_schema_has_category_index() {
    assert!(schema::CREATE_ITEMS_TABLE.contains("idx_items_category"));
}

#[tokio::test]
#[ignore = "requires Postgres connection"]
async fn test_event_insert_round_trip() {
    let store = ItemStore::new(create_test_postgres_config()).await.unwrap();
    store.initialize_schema().await.unwrap();

    let event = Event {
        id: None,
        user_id: 1,
        item_id: 2,
        event_type: EventType::Purchase,
        session_id: "s1".to_string(),
        metadata: None,
        timestamp: Some(Utc::now()),
    };

    let id = store.insert_event(&event).await.unwrap();
    assert!(id > 0);
}

#[tokio::test]
#[ignore = "requires Postgres connection"]
async fn test_model_metadata_insert() {
    let store = ItemStore::new(create_test_postgres_config()).await.unwrap();
    store.initialize_schema().await.unwrap();

    let model = crate::types::ModelMeta {
        id: None,
        model_name: "item-knn".to_string(),
        version: "2026-08-01".to_string(),
        model_type: "knn".to_string(),
        metrics: serde_json::json!({"recall_at_20": 0.41}),
        config: serde_json::json!({"k": 20}),
        created_at: None,
    };

    let id = store.insert_model(&model).await.unwrap();
    assert!(id > 0);
}

#[tokio::test]
#[ignore = "requires Postgres connection"]
async fn test_get_item_returns_none_for_unknown_id() {
    let store = ItemStore::new(create_test_postgres_config()).await.unwrap();
    store.initialize_schema().await.unwrap();

    let item = store.get_item(i64::MAX - 1).await.unwrap();
    assert!(item.is_none());
}

#[tokio::test]
#[ignore = "requires Postgres connection"]
async fn test_get_items_empty_input_short_circuits() {
    let store = ItemStore::new(create_test_postgres_config()).await.unwrap();

    let items = store.get_items(&[]).await.unwrap();
    assert!(items.is_empty());
}
