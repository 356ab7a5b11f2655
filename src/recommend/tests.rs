use super::scoring::*;
use crate::config::BlendWeights;
use crate::types::{CandidateScores, RecoReason};
use std::collections::{HashMap, HashSet};

fn default_weights() -> BlendWeights {
    BlendWeights {
        coview: 1.0,
        embedding: 0.8,
        popularity: 0.3,
        recency: 0.5,
    }
}

#[test]
fn test_coview_accumulation_excludes_recent_items() {
    // User 2 just viewed 100; 200 and 300 were co-viewed with it by user 1.
    let mut candidates = HashMap::new();
    let recents: HashSet<i64> = [100].into_iter().collect();

    accumulate_coview(
        &mut candidates,
        &recents,
        &[(200, 2.0), (300, 1.0), (100, 5.0)],
    );

    assert!(!candidates.contains_key(&100));
    assert_eq!(candidates[&200].coview, 2.0);
    assert_eq!(candidates[&300].coview, 1.0);
}

#[test]
fn test_coview_scores_add_across_seeds() {
    let mut candidates = HashMap::new();
    let recents = HashSet::new();

    accumulate_coview(&mut candidates, &recents, &[(5, 1.0)]);
    accumulate_coview(&mut candidates, &recents, &[(5, 3.0)]);

    assert_eq!(candidates[&5].coview, 4.0);
}

#[test]
fn test_knn_rank_decay() {
    let mut candidates = HashMap::new();
    let recents = HashSet::new();

    let neighbors: Vec<i64> = (1..=20).collect();
    accumulate_knn(&mut candidates, &recents, &neighbors);

    // Rank 0 contributes 20/20, the last rank 1/20.
    assert_eq!(candidates[&1].embedding, 1.0);
    assert_eq!(candidates[&20].embedding, 0.05);
    assert!(candidates[&1].embedding > candidates[&2].embedding);
}

#[test]
fn test_knn_excludes_recent_items() {
    let mut candidates = HashMap::new();
    let recents: HashSet<i64> = [3].into_iter().collect();

    accumulate_knn(&mut candidates, &recents, &[3, 4]);

    assert!(!candidates.contains_key(&3));
    assert!(candidates.contains_key(&4));
}

#[test]
fn test_popularity_accumulation_excludes_recent_items() {
    let mut candidates = HashMap::new();
    let recents: HashSet<i64> = [42].into_iter().collect();

    accumulate_popularity(&mut candidates, &recents, &[(42, 10.0), (43, 1.0)]);

    assert!(!candidates.contains_key(&42));
    assert_eq!(candidates[&43].popularity, 1.0);
}

#[test]
fn test_blend_is_linear_in_weights() {
    let scores = CandidateScores {
        coview: 2.0,
        embedding: 1.0,
        popularity: 4.0,
        recency: 0.0,
    };
    let weights = default_weights();

    let expected = 2.0 * 1.0 + 1.0 * 0.8 + 4.0 * 0.3;
    assert!((blend(&scores, &weights) - expected).abs() < 1e-9);
}

#[test]
fn test_zero_recency_weight_is_harmless() {
    let scores = CandidateScores {
        coview: 1.0,
        recency: 100.0,
        ..Default::default()
    };
    let mut weights = default_weights();
    weights.recency = 0.0;

    assert!((blend(&scores, &weights) - 1.0).abs() < 1e-9);
}

#[test]
fn test_reason_requires_strict_coview_dominance() {
    let coview_wins = CandidateScores {
        coview: 3.0,
        embedding: 2.0,
        popularity: 1.0,
        recency: 0.0,
    };
    assert_eq!(reason(&coview_wins), RecoReason::CoView);

    // A tie with either other source is not dominance.
    let tied = CandidateScores {
        coview: 2.0,
        embedding: 2.0,
        popularity: 1.0,
        recency: 0.0,
    };
    assert_eq!(reason(&tied), RecoReason::Embedding);

    let embedding_wins = CandidateScores {
        coview: 0.0,
        embedding: 0.5,
        popularity: 0.2,
        recency: 0.0,
    };
    assert_eq!(reason(&embedding_wins), RecoReason::Embedding);

    let popular_only = CandidateScores {
        popularity: 5.0,
        ..Default::default()
    };
    assert_eq!(reason(&popular_only), RecoReason::Popular);

    // All zero falls through to popular.
    assert_eq!(reason(&CandidateScores::default()), RecoReason::Popular);
}

#[test]
fn test_rank_sorts_descending_and_truncates() {
    let mut candidates = HashMap::new();
    for (item_id, coview) in [(1, 1.0), (2, 5.0), (3, 3.0), (4, 4.0), (5, 2.0)] {
        candidates.insert(
            item_id,
            CandidateScores {
                coview,
                ..Default::default()
            },
        );
    }

    let ranked = rank(candidates, &default_weights(), 3);

    assert_eq!(ranked.len(), 3);
    let ids: Vec<i64> = ranked.iter().map(|r| r.item_id).collect();
    assert_eq!(ids, vec![2, 4, 3]);
    for pair in ranked.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn test_rank_on_empty_candidates_is_empty() {
    let ranked = rank(HashMap::new(), &default_weights(), 10);
    assert!(ranked.is_empty());
}

#[test]
fn test_cold_user_path_yields_popular_reasons() {
    // No recents: only the popularity fallback contributes, so every
    // recommendation carries the popular reason and scores are
    // non-increasing.
    let mut candidates = HashMap::new();
    let recents = HashSet::new();

    let popular: Vec<(i64, f64)> = (1..=10).map(|i| (i, (11 - i) as f64)).collect();
    accumulate_popularity(&mut candidates, &recents, &popular);

    let ranked = rank(candidates, &default_weights(), 5);
    assert_eq!(ranked.len(), 5);
    for rec in &ranked {
        assert_eq!(rec.reason, RecoReason::Popular);
    }
    for pair in ranked.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn test_coview_pickup_scenario() {
    // User 1 viewed 100, 200, 300; user 2 then viewed 100. The processor has
    // paired (100,200) and (100,300), so from user 2's perspective item 100
    // seeds partners 200 and 300 while 100 itself is excluded as recent.
    let mut candidates = HashMap::new();
    let recents: HashSet<i64> = [100].into_iter().collect();

    accumulate_coview(&mut candidates, &recents, &[(200, 1.0), (300, 1.0)]);

    let ranked = rank(candidates, &default_weights(), 3);
    let ids: HashSet<i64> = ranked.iter().map(|r| r.item_id).collect();
    assert!(ids.contains(&200));
    assert!(ids.contains(&300));
    assert!(!ids.contains(&100));
    for rec in &ranked {
        assert_eq!(rec.reason, RecoReason::CoView);
    }
}

#[test]
fn test_candidates_never_include_any_recent_item() {
    // Feed every source an overlap with the recent window.
    let recents: HashSet<i64> = [10, 11, 12, 13, 14].into_iter().collect();
    let mut candidates = HashMap::new();

    accumulate_coview(&mut candidates, &recents, &[(10, 9.0), (20, 1.0)]);
    accumulate_knn(&mut candidates, &recents, &[11, 21]);
    accumulate_popularity(&mut candidates, &recents, &[(12, 8.0), (22, 2.0)]);

    let ranked = rank(candidates, &default_weights(), 10);
    for rec in &ranked {
        assert!(!recents.contains(&rec.item_id));
    }
    assert_eq!(ranked.len(), 3);
}
