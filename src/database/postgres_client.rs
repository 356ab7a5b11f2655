use chrono::Utc;
use deadpool_postgres::{Config as DeadpoolConfig, Pool, PoolConfig, Runtime};
use std::time::Duration;
use tokio::time::timeout;
use tokio_postgres::{NoTls, Row};
use tracing::{debug, info};

use crate::config::PostgresConfig;
use crate::database::schema;
use crate::error::{RecoError, RecoResult};
use crate::types::{Event, Item, ModelMeta};

/// Per-query deadline
const QUERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Postgres client wrapper with connection pooling
pub struct PostgresClient {
    pool: Pool,
}

impl PostgresClient {
    /// Create a new Postgres client with connection pooling
    pub async fn new(config: PostgresConfig) -> RecoResult<Self> {
        info!(
            "Initializing Postgres client for {}:{}/{}",
            config.host, config.port, config.database
        );

        let mut pg_config = DeadpoolConfig::new();
        pg_config.host = Some(config.host.clone());
        pg_config.port = Some(config.port);
        pg_config.user = Some(config.user.clone());
        pg_config.password = Some(config.password.clone());
        pg_config.dbname = Some(config.database.clone());
        pg_config.pool = Some(PoolConfig::new(config.max_connections as usize));

        let pool = pg_config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| RecoError::Database(format!("Failed to create connection pool: {}", e)))?;

        // Test connectivity before declaring the store ready
        let client = timeout(
            Duration::from_secs(config.connection_timeout_secs),
            pool.get(),
        )
        .await
        .map_err(|_| RecoError::Database("Connection checkout timed out".to_string()))?
        .map_err(|e| RecoError::Database(format!("Failed to get connection from pool: {}", e)))?;

        client
            .query("SELECT 1", &[])
            .await
            .map_err(|e| RecoError::Database(format!("Failed to test connection: {}", e)))?;

        info!("Postgres client connected successfully");

        Ok(PostgresClient { pool })
    }

    /// Get an item by id; `Ok(None)` when the id is unknown
    pub async fn get_item(&self, item_id: i64) -> RecoResult<Option<Item>> {
        debug!("Retrieving item by id: {}", item_id);

        let client = self
            .pool
            .get()
            .await
            .map_err(|e| RecoError::Database(format!("Failed to get connection: {}", e)))?;

        let query = "
            SELECT id, sku, title, category, price, stock, metadata, created_at, updated_at
            FROM items
            WHERE id = $1
        ";

        let rows = timeout(QUERY_TIMEOUT, client.query(query, &[&item_id]))
            .await
            .map_err(|_| RecoError::Database("Item query timed out".to_string()))?
            .map_err(|e| RecoError::Database(format!("Failed to get item: {}", e)))?;

        match rows.first() {
            Some(row) => Ok(Some(row_to_item(row))),
            None => Ok(None),
        }
    }

    /// Get multiple items by ids
    pub async fn get_items(&self, item_ids: &[i64]) -> RecoResult<Vec<Item>> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Retrieving {} items by ids", item_ids.len());

        let client = self
            .pool
            .get()
            .await
            .map_err(|e| RecoError::Database(format!("Failed to get connection: {}", e)))?;

        let query = "
            SELECT id, sku, title, category, price, stock, metadata, created_at, updated_at
            FROM items
            WHERE id = ANY($1)
        ";

        let ids: Vec<i64> = item_ids.to_vec();
        let rows = timeout(QUERY_TIMEOUT, client.query(query, &[&ids]))
            .await
            .map_err(|_| RecoError::Database("Items query timed out".to_string()))?
            .map_err(|e| RecoError::Database(format!("Failed to get items: {}", e)))?;

        Ok(rows.iter().map(row_to_item).collect())
    }

    /// Insert an audit copy of an event, returning its assigned id
    pub async fn insert_event(&self, event: &Event) -> RecoResult<i64> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| RecoError::Database(format!("Failed to get connection: {}", e)))?;

        let query = "
            INSERT INTO events (user_id, item_id, event_type, session_id, metadata, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
        ";

        let metadata = event
            .metadata
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        let ts = event.timestamp.unwrap_or_else(Utc::now);

        let row = timeout(
            QUERY_TIMEOUT,
            client.query_one(
                query,
                &[
                    &event.user_id,
                    &event.item_id,
                    &event.event_type.as_str(),
                    &event.session_id,
                    &metadata,
                    &ts,
                ],
            ),
        )
        .await
        .map_err(|_| RecoError::Database("Event insert timed out".to_string()))?
        .map_err(|e| RecoError::Database(format!("Failed to insert event: {}", e)))?;

        Ok(row.get(0))
    }

    /// Insert offline-model metadata, returning its assigned id
    pub async fn insert_model(&self, model: &ModelMeta) -> RecoResult<i64> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| RecoError::Database(format!("Failed to get connection: {}", e)))?;

        let query = "
            INSERT INTO models (model_name, version, model_type, metrics, config)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
        ";

        let row = timeout(
            QUERY_TIMEOUT,
            client.query_one(
                query,
                &[
                    &model.model_name,
                    &model.version,
                    &model.model_type,
                    &model.metrics,
                    &model.config,
                ],
            ),
        )
        .await
        .map_err(|_| RecoError::Database("Model insert timed out".to_string()))?
        .map_err(|e| RecoError::Database(format!("Failed to insert model: {}", e)))?;

        Ok(row.get(0))
    }

    /// Create the tables this service touches, if they do not exist
    pub async fn initialize_schema(&self) -> RecoResult<()> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| RecoError::Database(format!("Failed to get connection: {}", e)))?;

        for statement in schema::STATEMENTS {
            client
                .batch_execute(statement)
                .await
                .map_err(|e| RecoError::Database(format!("Failed to apply schema: {}", e)))?;
        }

        info!("Database schema initialized");
        Ok(())
    }

    /// Check database connection health
    pub async fn health_check(&self) -> RecoResult<()> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| RecoError::Database(format!("Failed to get connection: {}", e)))?;

        timeout(Duration::from_secs(5), client.query("SELECT 1", &[]))
            .await
            .map_err(|_| RecoError::Database("Health check timed out".to_string()))?
            .map_err(|e| RecoError::Database(format!("Health check failed: {}", e)))?;

        Ok(())
    }
}

fn row_to_item(row: &Row) -> Item {
    Item {
        id: row.get(0),
        sku: row.get(1),
        title: row.get(2),
        category: row.get(3),
        price: row.get(4),
        stock: row.get(5),
        metadata: row.get(6),
        created_at: row.get(7),
        updated_at: row.get(8),
    }
}
