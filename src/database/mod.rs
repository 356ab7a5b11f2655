/// Database module
///
/// Facade over the relational system of record. The core uses it for two
/// reads (single item, batch of items) and two writes (event audit copy,
/// offline-model metadata).
mod postgres_client;
pub mod schema;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use tracing::info;

use crate::config::PostgresConfig;
use crate::error::RecoResult;
use crate::types::{Event, Item, ModelMeta};
use postgres_client::PostgresClient;

/// Item store backed by the relational system of record
pub struct ItemStore {
    postgres_client: Arc<PostgresClient>,
}

impl ItemStore {
    /// Create an item store with a Postgres connection pool
    pub async fn new(postgres_config: PostgresConfig) -> RecoResult<Self> {
        info!("Initializing item store");

        let postgres_client = PostgresClient::new(postgres_config).await?;

        info!("Item store initialized successfully");

        Ok(ItemStore {
            postgres_client: Arc::new(postgres_client),
        })
    }

    /// Get an item by id; `Ok(None)` when unknown
    pub async fn get_item(&self, item_id: i64) -> RecoResult<Option<Item>> {
        self.postgres_client.get_item(item_id).await
    }

    /// Get multiple items by ids
    pub async fn get_items(&self, item_ids: &[i64]) -> RecoResult<Vec<Item>> {
        self.postgres_client.get_items(item_ids).await
    }

    /// Insert an audit copy of an event, returning its assigned id
    pub async fn insert_event(&self, event: &Event) -> RecoResult<i64> {
        self.postgres_client.insert_event(event).await
    }

    /// Insert offline-model metadata, returning its assigned id
    pub async fn insert_model(&self, model: &ModelMeta) -> RecoResult<i64> {
        self.postgres_client.insert_model(model).await
    }

    /// Create the tables this service touches, if missing
    pub async fn initialize_schema(&self) -> RecoResult<()> {
        self.postgres_client.initialize_schema().await
    }

    /// Check database connection health
    pub async fn health_check(&self) -> RecoResult<()> {
        self.postgres_client.health_check().await
    }
}
