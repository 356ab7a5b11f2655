use fred::{
    clients::RedisPool,
    interfaces::{ClientLike, KeysInterface, ListInterface, SortedSetsInterface},
    types::{Builder, Expiration, ReconnectPolicy, RedisConfig as FredRedisConfig, RedisValue},
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info};

use crate::config::RedisConfig;
use crate::error::{RecoError, RecoResult};

/// TTL for per-user recent-items lists
const RECENT_TTL_SECS: i64 = 24 * 60 * 60;
/// TTL for per-anchor co-view sets and per-item KNN lists
const WEEK_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Wire-level key layout, frozen so separate deployments interoperate with a
/// live store. Numeric members are rendered as decimal ASCII.
fn recent_key(user_id: i64) -> String {
    format!("user:recent:{}", user_id)
}

const POPULARITY_KEY: &str = "item:popularity";

fn coview_key(item_id: i64) -> String {
    format!("co_view:{}", item_id)
}

fn knn_key(item_id: i64) -> String {
    format!("item:knn:{}", item_id)
}

fn reco_cache_key(user_id: i64) -> String {
    format!("cache:reco:{}", user_id)
}

/// Redis client wrapper with connection pooling and error handling
pub struct RedisClient {
    /// Fred Redis client with connection pooling
    client: RedisPool,
    /// Recommendation-cache statistics
    stats: Arc<CacheStatsInternal>,
}

/// Internal cache statistics with atomic counters for thread safety
#[derive(Debug, Default)]
struct CacheStatsInternal {
    reco_cache_hits: AtomicU64,
    reco_cache_misses: AtomicU64,
}

impl RedisClient {
    /// Create a new Redis client pool and wait for it to connect
    pub async fn new(config: RedisConfig) -> RecoResult<Self> {
        info!("Initializing Redis client with URL: {}", &config.url);

        let redis_config = FredRedisConfig::from_url(&config.url)
            .map_err(|e| RecoError::Redis(format!("Invalid Redis URL: {}", e)))?;

        let connection_timeout = config.connection_timeout_secs;
        let command_timeout = config.command_timeout_secs;
        let client = Builder::from_config(redis_config)
            .with_connection_config(|conn_config| {
                conn_config.connection_timeout = Duration::from_secs(connection_timeout);
            })
            .with_performance_config(|perf_config| {
                perf_config.auto_pipeline = true;
                perf_config.default_command_timeout = Duration::from_secs(command_timeout);
            })
            .set_policy(ReconnectPolicy::new_exponential(
                config.max_retries,
                100,
                30_000,
                2,
            ))
            .build_pool(config.pool_size as usize)
            .map_err(|e| RecoError::Redis(format!("Failed to create Redis pool: {}", e)))?;

        let _ = client.connect();
        client
            .wait_for_connect()
            .await
            .map_err(|e| RecoError::Redis(format!("Failed to connect to Redis: {}", e)))?;

        info!("Redis client connected successfully");

        Ok(RedisClient {
            client,
            stats: Arc::new(CacheStatsInternal::default()),
        })
    }

    /// Prepend an item to the user's recent list, truncate to `limit`, and
    /// refresh the 24h TTL. The three sub-steps are issued as one pipeline so
    /// a partial failure surfaces as a single error.
    pub async fn add_recent(&self, user_id: i64, item_id: i64, limit: usize) -> RecoResult<()> {
        let key = recent_key(user_id);
        let pipeline = self.client.next().pipeline();

        let _: RedisValue = pipeline
            .lpush(&key, item_id.to_string())
            .await
            .map_err(|e| RecoError::Redis(format!("Failed to queue LPUSH: {}", e)))?;
        let _: RedisValue = pipeline
            .ltrim(&key, 0, limit as i64 - 1)
            .await
            .map_err(|e| RecoError::Redis(format!("Failed to queue LTRIM: {}", e)))?;
        let _: RedisValue = pipeline
            .expire(&key, RECENT_TTL_SECS)
            .await
            .map_err(|e| RecoError::Redis(format!("Failed to queue EXPIRE: {}", e)))?;

        let _: RedisValue = pipeline
            .all()
            .await
            .map_err(|e| RecoError::Redis(format!("Failed to add recent item: {}", e)))?;
        Ok(())
    }

    /// Return up to `count` most recent items for the user, newest first.
    /// Non-numeric members are skipped.
    pub async fn get_recent(&self, user_id: i64, count: usize) -> RecoResult<Vec<i64>> {
        let key = recent_key(user_id);

        let raw: Vec<String> = self
            .client
            .lrange(&key, 0, count as i64 - 1)
            .await
            .map_err(|e| RecoError::Redis(format!("Failed to get recent items: {}", e)))?;

        Ok(raw.iter().filter_map(|s| s.parse().ok()).collect())
    }

    /// Additively increment an item's global popularity score
    pub async fn incr_popularity(&self, item_id: i64, weight: f64) -> RecoResult<()> {
        let _: f64 = self
            .client
            .zincrby(POPULARITY_KEY, weight, item_id.to_string())
            .await
            .map_err(|e| RecoError::Redis(format!("Failed to increment popularity: {}", e)))?;
        Ok(())
    }

    /// Top `count` items by popularity, descending
    pub async fn top_popular(&self, count: usize) -> RecoResult<Vec<(i64, f64)>> {
        let raw: Vec<(String, f64)> = self
            .client
            .zrevrange(POPULARITY_KEY, 0, count as i64 - 1, true)
            .await
            .map_err(|e| RecoError::Redis(format!("Failed to get popular items: {}", e)))?;

        Ok(raw
            .into_iter()
            .filter_map(|(member, score)| member.parse().ok().map(|id| (id, score)))
            .collect())
    }

    /// Increment the co-view count of `other` in the set anchored at `item_id`
    /// and refresh the anchor's 7-day TTL, as one pipeline.
    pub async fn incr_coview(&self, item_id: i64, other: i64) -> RecoResult<()> {
        let key = coview_key(item_id);
        let pipeline = self.client.next().pipeline();

        let _: RedisValue = pipeline
            .zincrby(&key, 1.0, other.to_string())
            .await
            .map_err(|e| RecoError::Redis(format!("Failed to queue ZINCRBY: {}", e)))?;
        let _: RedisValue = pipeline
            .expire(&key, WEEK_TTL_SECS)
            .await
            .map_err(|e| RecoError::Redis(format!("Failed to queue EXPIRE: {}", e)))?;

        let _: RedisValue = pipeline
            .all()
            .await
            .map_err(|e| RecoError::Redis(format!("Failed to increment co-view: {}", e)))?;
        Ok(())
    }

    /// Top `count` co-view partners of an item, descending by count
    pub async fn top_coview(&self, item_id: i64, count: usize) -> RecoResult<Vec<(i64, f64)>> {
        let key = coview_key(item_id);

        let raw: Vec<(String, f64)> = self
            .client
            .zrevrange(&key, 0, count as i64 - 1, true)
            .await
            .map_err(|e| RecoError::Redis(format!("Failed to get co-view items: {}", e)))?;

        Ok(raw
            .into_iter()
            .filter_map(|(member, score)| member.parse().ok().map(|id| (id, score)))
            .collect())
    }

    /// Replace an item's precomputed nearest-neighbor list and refresh its
    /// 7-day TTL, as one pipeline.
    pub async fn set_knn(&self, item_id: i64, neighbors: &[i64]) -> RecoResult<()> {
        let key = knn_key(item_id);
        let pipeline = self.client.next().pipeline();

        let _: RedisValue = pipeline
            .del(&key)
            .await
            .map_err(|e| RecoError::Redis(format!("Failed to queue DEL: {}", e)))?;
        if !neighbors.is_empty() {
            let members: Vec<String> = neighbors.iter().map(|n| n.to_string()).collect();
            let _: RedisValue = pipeline
                .rpush(&key, members)
                .await
                .map_err(|e| RecoError::Redis(format!("Failed to queue RPUSH: {}", e)))?;
        }
        let _: RedisValue = pipeline
            .expire(&key, WEEK_TTL_SECS)
            .await
            .map_err(|e| RecoError::Redis(format!("Failed to queue EXPIRE: {}", e)))?;

        let _: RedisValue = pipeline
            .all()
            .await
            .map_err(|e| RecoError::Redis(format!("Failed to store KNN list: {}", e)))?;
        Ok(())
    }

    /// First `count` precomputed neighbors of an item, in rank order
    pub async fn get_knn(&self, item_id: i64, count: usize) -> RecoResult<Vec<i64>> {
        let key = knn_key(item_id);

        let raw: Vec<String> = self
            .client
            .lrange(&key, 0, count as i64 - 1)
            .await
            .map_err(|e| RecoError::Redis(format!("Failed to get KNN items: {}", e)))?;

        Ok(raw.iter().filter_map(|s| s.parse().ok()).collect())
    }

    /// Store a serialized recommendation response for the user
    pub async fn cache_reco(&self, user_id: i64, payload: &str, ttl: Duration) -> RecoResult<()> {
        let key = reco_cache_key(user_id);

        debug!("Caching recommendations for user_id: {}", user_id);

        let _: () = self
            .client
            .set(
                &key,
                payload,
                Some(Expiration::EX(ttl.as_secs() as i64)),
                None,
                false,
            )
            .await
            .map_err(|e| RecoError::Redis(format!("Failed to cache recommendations: {}", e)))?;

        Ok(())
    }

    /// Read the user's cached recommendation payload. `Ok(None)` is a cache
    /// miss; backend failures are errors.
    pub async fn get_cached_reco(&self, user_id: i64) -> RecoResult<Option<String>> {
        let key = reco_cache_key(user_id);

        let result: Option<String> = self
            .client
            .get(&key)
            .await
            .map_err(|e| RecoError::Redis(format!("Failed to get cached recommendations: {}", e)))?;

        match result {
            Some(payload) => {
                self.stats.reco_cache_hits.fetch_add(1, Ordering::Relaxed);
                debug!("Recommendation cache HIT for user_id: {}", user_id);
                Ok(Some(payload))
            }
            None => {
                self.stats.reco_cache_misses.fetch_add(1, Ordering::Relaxed);
                debug!("Recommendation cache MISS for user_id: {}", user_id);
                Ok(None)
            }
        }
    }

    /// Check Redis connection health
    pub async fn health_check(&self) -> RecoResult<()> {
        let ping_result = timeout(Duration::from_secs(5), self.client.ping::<String>()).await;

        match ping_result {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => {
                error!("Redis health check failed: {}", e);
                Err(RecoError::Redis(format!("Health check failed: {}", e)))
            }
            Err(_) => {
                error!("Redis health check timed out");
                Err(RecoError::Redis("Health check timed out".to_string()))
            }
        }
    }

    /// Get recommendation-cache hit/miss statistics
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            reco_cache_hits: self.stats.reco_cache_hits.load(Ordering::Relaxed),
            reco_cache_misses: self.stats.reco_cache_misses.load(Ordering::Relaxed),
        }
    }
}

/// Recommendation-cache statistics for monitoring hit ratios
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub reco_cache_hits: u64,
    pub reco_cache_misses: u64,
}

impl CacheStats {
    /// Calculate the cache hit ratio
    pub fn hit_ratio(&self) -> f64 {
        let total = self.reco_cache_hits + self.reco_cache_misses;
        if total == 0 {
            0.0
        } else {
            self.reco_cache_hits as f64 / total as f64
        }
    }
}
