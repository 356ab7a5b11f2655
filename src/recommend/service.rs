use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::database::ItemStore;
use crate::error::{RecoError, RecoResult};
use crate::features::FeatureStore;
use crate::observability::metrics;
use crate::recommend::scoring;
use crate::types::{CandidateScores, RecoReason, Recommendation, RecommendationResponse};

/// Budget for the detached cache write, independent of any request deadline
const CACHE_WRITE_BUDGET: Duration = Duration::from_secs(3);

/// Request-time recommendation service: candidate generation, scoring, and
/// per-user response caching.
pub struct RecommendService {
    features: Arc<FeatureStore>,
    items: Arc<ItemStore>,
    config: Arc<Config>,
}

impl RecommendService {
    pub fn new(config: Arc<Config>, features: Arc<FeatureStore>, items: Arc<ItemStore>) -> Self {
        RecommendService {
            features,
            items,
            config,
        }
    }

    /// Generate personalized recommendations for a user.
    ///
    /// The cached response is returned verbatim when present. On a miss the
    /// freshly generated response is returned first and cached from a
    /// detached task, so the write never delays the caller and survives the
    /// request deadline.
    pub async fn recommend(
        &self,
        user_id: i64,
        count: usize,
    ) -> RecoResult<RecommendationResponse> {
        let m = metrics::global();
        m.recommendation_requests.inc();
        let _timer = m
            .recommendation_latency
            .with_label_values(&["personalized"])
            .start_timer();

        if let Some(cached) = self.cached_response(user_id).await {
            m.recommendation_cache_hits.inc();
            debug!("Cache hit for recommendations (user_id: {})", user_id);
            return Ok(cached);
        }
        m.recommendation_cache_misses.inc();

        let recommendations = self.generate(user_id, count).await?;

        let response = RecommendationResponse {
            user_id,
            recommendations,
        };

        self.spawn_cache_write(&response);

        Ok(response)
    }

    /// Globally popular items, optionally filtered to one category.
    ///
    /// The popularity set is oversampled by 2x so filtering can still fill
    /// the requested count; candidates whose catalog lookup fails or whose
    /// category mismatches are dropped.
    pub async fn popular(
        &self,
        category: Option<&str>,
        count: usize,
    ) -> RecoResult<Vec<Recommendation>> {
        let _timer = metrics::global()
            .recommendation_latency
            .with_label_values(&["popular"])
            .start_timer();

        let popular = self.features.top_popular(count * 2).await?;

        let mut recommendations = Vec::new();
        for (item_id, score) in popular {
            if let Some(category) = category {
                match self.items.get_item(item_id).await {
                    Ok(Some(item)) if item.category == category => {}
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Item lookup failed for {}: {}", item_id, e);
                        continue;
                    }
                }
            }

            recommendations.push(Recommendation {
                item_id,
                score,
                reason: RecoReason::Popular,
            });

            if recommendations.len() >= count {
                break;
            }
        }

        Ok(recommendations)
    }

    /// Candidate generation: expand the user's recent items through co-view
    /// and KNN, fall back to global popularity, then blend and rank.
    async fn generate(&self, user_id: i64, count: usize) -> RecoResult<Vec<Recommendation>> {
        let mut candidates: HashMap<i64, CandidateScores> = HashMap::new();
        let mut degraded = false;

        let recents = match self.features.get_recent(user_id, scoring::SEED_COUNT).await {
            Ok(recents) => recents,
            Err(e) => {
                warn!("Failed to get recent items: {}", e);
                degraded = true;
                Vec::new()
            }
        };
        let recent_set: HashSet<i64> = recents.iter().copied().collect();

        for &seed in &recents {
            match self.features.top_coview(seed, scoring::COVIEW_FANOUT).await {
                Ok(partners) => {
                    scoring::accumulate_coview(&mut candidates, &recent_set, &partners)
                }
                Err(e) => {
                    warn!("Failed to get co-view items for {}: {}", seed, e);
                    degraded = true;
                }
            }

            match self.features.get_knn(seed, scoring::KNN_FANOUT).await {
                Ok(neighbors) => scoring::accumulate_knn(&mut candidates, &recent_set, &neighbors),
                Err(e) => {
                    warn!("Failed to get KNN items for {}: {}", seed, e);
                    degraded = true;
                }
            }
        }

        if candidates.len() < count {
            match self.features.top_popular(count * 2).await {
                Ok(popular) => {
                    scoring::accumulate_popularity(&mut candidates, &recent_set, &popular)
                }
                Err(e) => {
                    warn!("Failed to get popular items: {}", e);
                    degraded = true;
                }
            }
        }

        if candidates.is_empty() && degraded {
            return Err(RecoError::Redis(
                "No recommendation source available".to_string(),
            ));
        }

        Ok(scoring::rank(
            candidates,
            &self.config.recommendation.weights,
            count,
        ))
    }

    /// Read and decode the user's cached response. Backend errors and
    /// undecodable payloads degrade to a miss.
    async fn cached_response(&self, user_id: i64) -> Option<RecommendationResponse> {
        match self.features.get_cached_reco(user_id).await {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(response) => Some(response),
                Err(e) => {
                    warn!("Discarding undecodable cache entry for {}: {}", user_id, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Recommendation cache read failed: {}", e);
                None
            }
        }
    }

    /// Write the response to the per-user cache from a detached task with its
    /// own deadline, owned by the process rather than the request.
    fn spawn_cache_write(&self, response: &RecommendationResponse) {
        let payload = match serde_json::to_string(response) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to serialize recommendations for cache: {}", e);
                return;
            }
        };

        let features = self.features.clone();
        let user_id = response.user_id;
        let ttl = self.config.recommendation.cache_ttl();

        tokio::spawn(async move {
            match timeout(CACHE_WRITE_BUDGET, features.cache_reco(user_id, &payload, ttl)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Failed to cache recommendations: {}", e),
                Err(_) => error!("Recommendation cache write timed out"),
            }
        });
    }
}
