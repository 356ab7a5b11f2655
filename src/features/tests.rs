use super::*;
use crate::config::RedisConfig;
use std::env;

/// Helper to create a test Redis config
fn create_test_redis_config() -> RedisConfig {
    RedisConfig {
        url: env::var("RECO_REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
        pool_size: 5,
        max_retries: 1,
        connection_timeout_secs: 5,
        command_timeout_secs: 3,
    }
}

#[tokio::test]
#[ignore = "requires Redis connection"]
async fn test_recent_items_never_exceed_limit() {
    let store = FeatureStore::new(create_test_redis_config()).await.unwrap();
    let user_id = 910_001;
    let limit = 5;

    for item_id in 1..=20 {
        store.add_recent(user_id, item_id, limit).await.unwrap();
        let recents = store.get_recent(user_id, 100).await.unwrap();
        assert!(recents.len() <= limit);
    }

    // Newest first, bounded to the last `limit` writes.
    let recents = store.get_recent(user_id, 100).await.unwrap();
    assert_eq!(recents, vec![20, 19, 18, 17, 16]);
}

#[tokio::test]
#[ignore = "requires Redis connection"]
async fn test_recent_items_keep_duplicates() {
    let store = FeatureStore::new(create_test_redis_config()).await.unwrap();
    let user_id = 910_002;

    store.add_recent(user_id, 7, 10).await.unwrap();
    store.add_recent(user_id, 7, 10).await.unwrap();

    let recents = store.get_recent(user_id, 10).await.unwrap();
    assert_eq!(recents, vec![7, 7]);
}

#[tokio::test]
#[ignore = "requires Redis connection"]
async fn test_popularity_is_additive() {
    let store = FeatureStore::new(create_test_redis_config()).await.unwrap();
    let item_id = 910_100;

    store.incr_popularity(item_id, 1.0).await.unwrap();
    store.incr_popularity(item_id, 10.0).await.unwrap();

    let popular = store.top_popular(1000).await.unwrap();
    let score = popular
        .iter()
        .find(|(id, _)| *id == item_id)
        .map(|(_, s)| *s)
        .unwrap();
    assert!(score >= 11.0);
}

#[tokio::test]
#[ignore = "requires Redis connection"]
async fn test_coview_pair_increments_both_directions() {
    let store = FeatureStore::new(create_test_redis_config()).await.unwrap();
    let (a, b) = (910_200, 910_201);

    store.incr_coview(a, b).await.unwrap();
    store.incr_coview(b, a).await.unwrap();

    let partners_of_a = store.top_coview(a, 10).await.unwrap();
    let partners_of_b = store.top_coview(b, 10).await.unwrap();
    assert!(partners_of_a.iter().any(|(id, s)| *id == b && *s >= 1.0));
    assert!(partners_of_b.iter().any(|(id, s)| *id == a && *s >= 1.0));
}

#[tokio::test]
#[ignore = "requires Redis connection"]
async fn test_set_knn_replaces_existing_list() {
    let store = FeatureStore::new(create_test_redis_config()).await.unwrap();
    let item_id = 910_300;

    store.set_knn(item_id, &[1, 2, 3]).await.unwrap();
    store.set_knn(item_id, &[4, 5]).await.unwrap();

    let neighbors = store.get_knn(item_id, 10).await.unwrap();
    assert_eq!(neighbors, vec![4, 5]);

    let first = store.get_knn(item_id, 1).await.unwrap();
    assert_eq!(first, vec![4]);
}

#[tokio::test]
#[ignore = "requires Redis connection"]
async fn test_reco_cache_round_trip_is_bitwise_equal() {
    let store = FeatureStore::new(create_test_redis_config()).await.unwrap();
    let user_id = 910_400;
    let payload = r#"{"user_id":910400,"recommendations":[{"item_id":1,"score":0.9,"reason":"co_view"}]}"#;

    store
        .cache_reco(user_id, payload, std::time::Duration::from_secs(60))
        .await
        .unwrap();

    let cached = store.get_cached_reco(user_id).await.unwrap();
    assert_eq!(cached.as_deref(), Some(payload));

    let stats = store.cache_stats();
    assert!(stats.reco_cache_hits >= 1);
}

#[tokio::test]
#[ignore = "requires Redis connection"]
async fn test_cache_miss_is_not_an_error() {
    let store = FeatureStore::new(create_test_redis_config()).await.unwrap();

    let cached = store.get_cached_reco(987_654_321).await.unwrap();
    assert!(cached.is_none());
}
