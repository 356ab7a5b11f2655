use std::collections::{HashMap, HashSet};

use crate::config::BlendWeights;
use crate::types::{CandidateScores, RecoReason, Recommendation};

/// How many recent items seed candidate generation
pub const SEED_COUNT: usize = 5;
/// Co-view partners fetched per seed
pub const COVIEW_FANOUT: usize = 20;
/// Precomputed neighbors fetched per seed
pub const KNN_FANOUT: usize = 20;

/// Fold one seed's co-view partners into the candidate pool. Items already in
/// the user's recent window are never candidates.
pub fn accumulate_coview(
    candidates: &mut HashMap<i64, CandidateScores>,
    recents: &HashSet<i64>,
    partners: &[(i64, f64)],
) {
    for (item_id, score) in partners {
        if recents.contains(item_id) {
            continue;
        }
        candidates.entry(*item_id).or_default().coview += score;
    }
}

/// Fold one seed's KNN list into the candidate pool. Rank r contributes
/// (FANOUT - r) / FANOUT, so the nearest neighbor scores 1.0 and the last one
/// 1/FANOUT.
pub fn accumulate_knn(
    candidates: &mut HashMap<i64, CandidateScores>,
    recents: &HashSet<i64>,
    neighbors: &[i64],
) {
    for (rank, item_id) in neighbors.iter().enumerate() {
        if recents.contains(item_id) {
            continue;
        }
        candidates.entry(*item_id).or_default().embedding +=
            (KNN_FANOUT - rank) as f64 / KNN_FANOUT as f64;
    }
}

/// Fold global popularity into the candidate pool as a fallback source
pub fn accumulate_popularity(
    candidates: &mut HashMap<i64, CandidateScores>,
    recents: &HashSet<i64>,
    popular: &[(i64, f64)],
) {
    for (item_id, score) in popular {
        if recents.contains(item_id) {
            continue;
        }
        candidates.entry(*item_id).or_default().popularity += score;
    }
}

/// Linear blend of the partial scores
pub fn blend(scores: &CandidateScores, weights: &BlendWeights) -> f64 {
    scores.coview * weights.coview
        + scores.embedding * weights.embedding
        + scores.popularity * weights.popularity
        + scores.recency * weights.recency
}

/// Dominant source tag for explainability. Co-view wins only when it strictly
/// dominates both other sources.
pub fn reason(scores: &CandidateScores) -> RecoReason {
    if scores.coview > scores.embedding && scores.coview > scores.popularity {
        RecoReason::CoView
    } else if scores.embedding > scores.popularity {
        RecoReason::Embedding
    } else {
        RecoReason::Popular
    }
}

/// Blend, tag, sort descending by final score, and truncate to `count`
pub fn rank(
    candidates: HashMap<i64, CandidateScores>,
    weights: &BlendWeights,
    count: usize,
) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = candidates
        .into_iter()
        .map(|(item_id, scores)| Recommendation {
            item_id,
            score: blend(&scores, weights),
            reason: reason(&scores),
        })
        .collect();

    recommendations.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    recommendations.truncate(count);

    recommendations
}
