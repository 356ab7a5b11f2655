/// Feature store module
///
/// Typed facade over the Redis-backed online feature store. It owns the key
/// layout and TTLs for the four live feature structures (recent items,
/// popularity, co-view counts, KNN lists) and the per-user recommendation
/// cache. Compound updates are pipelined so partial failure surfaces as a
/// single error.
mod redis_client;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::RedisConfig;
use crate::error::RecoResult;
use redis_client::RedisClient;

pub use redis_client::CacheStats;

/// Online feature store shared by the stream processor and the recommender
pub struct FeatureStore {
    redis_client: Arc<RedisClient>,
}

impl FeatureStore {
    /// Create a feature store backed by a Redis connection pool
    pub async fn new(redis_config: RedisConfig) -> RecoResult<Self> {
        info!("Initializing feature store");

        let redis_client = RedisClient::new(redis_config).await?;
        redis_client.health_check().await?;

        info!("Feature store initialized successfully");

        Ok(FeatureStore {
            redis_client: Arc::new(redis_client),
        })
    }

    /// Prepend an item to the user's recent list, bounded to `limit` entries.
    /// Duplicates are allowed; deduplication is a reader-side concern.
    pub async fn add_recent(&self, user_id: i64, item_id: i64, limit: usize) -> RecoResult<()> {
        self.redis_client.add_recent(user_id, item_id, limit).await
    }

    /// Up to `count` most recent items for the user, newest first
    pub async fn get_recent(&self, user_id: i64, count: usize) -> RecoResult<Vec<i64>> {
        self.redis_client.get_recent(user_id, count).await
    }

    /// Additively increment an item's global popularity
    pub async fn incr_popularity(&self, item_id: i64, weight: f64) -> RecoResult<()> {
        self.redis_client.incr_popularity(item_id, weight).await
    }

    /// Top `count` items by popularity score, descending
    pub async fn top_popular(&self, count: usize) -> RecoResult<Vec<(i64, f64)>> {
        self.redis_client.top_popular(count).await
    }

    /// Count one co-occurrence of `other` in the set anchored at `item_id`.
    /// Symmetry is the caller's responsibility: issue the mirrored call too.
    pub async fn incr_coview(&self, item_id: i64, other: i64) -> RecoResult<()> {
        self.redis_client.incr_coview(item_id, other).await
    }

    /// Top `count` co-view partners of an item, descending by count
    pub async fn top_coview(&self, item_id: i64, count: usize) -> RecoResult<Vec<(i64, f64)>> {
        self.redis_client.top_coview(item_id, count).await
    }

    /// Atomically replace an item's precomputed nearest-neighbor list.
    /// Written by the offline training job; the online path only reads it.
    pub async fn set_knn(&self, item_id: i64, neighbors: &[i64]) -> RecoResult<()> {
        self.redis_client.set_knn(item_id, neighbors).await
    }

    /// First `count` precomputed neighbors of an item, in rank order
    pub async fn get_knn(&self, item_id: i64, count: usize) -> RecoResult<Vec<i64>> {
        self.redis_client.get_knn(item_id, count).await
    }

    /// Store a serialized `RecommendationResponse` for the user
    pub async fn cache_reco(&self, user_id: i64, payload: &str, ttl: Duration) -> RecoResult<()> {
        self.redis_client.cache_reco(user_id, payload, ttl).await
    }

    /// Read the user's cached recommendation payload; `None` is a miss
    pub async fn get_cached_reco(&self, user_id: i64) -> RecoResult<Option<String>> {
        self.redis_client.get_cached_reco(user_id).await
    }

    /// Recommendation-cache hit/miss statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.redis_client.cache_stats()
    }

    /// Check feature store connection health
    pub async fn health_check(&self) -> RecoResult<()> {
        self.redis_client.health_check().await
    }
}
