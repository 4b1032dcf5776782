//! Scoring engine: four independent partial scores fused with fixed
//! weights into a deterministic ranking.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::graph::store::GraphStore;
use crate::index::SearchIndex;
use crate::model::node::UserNode;
use crate::model::record::parse_datetime;

/// Fusion weights. Fixed — never query-dependent.
pub const CONTENT_WEIGHT: f64 = 0.4;
pub const TEMPORAL_WEIGHT: f64 = 0.2;
pub const USER_WEIGHT: f64 = 0.3;
pub const GRAPH_WEIGHT: f64 = 0.1;

/// Extra content credit when a query term also appears in the subject.
const SUBJECT_BONUS: f64 = 0.5;

/// Freshness half-life-ish constant: `exp(-days_old / 30)`.
const FRESHNESS_DECAY_DAYS: f64 = 30.0;

/// Role weights for user-match scoring.
const SENDER_ROLE_WEIGHT: f64 = 1.0;
const RECIPIENT_ROLE_WEIGHT: f64 = 0.7;

/// The four partial scores plus their fusion, per result.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Scores {
    pub total: f64,
    pub content: f64,
    pub temporal: f64,
    pub user: f64,
    pub graph: f64,
}

impl Scores {
    /// Fuse the partials: `0.4·content + 0.2·temporal + 0.3·user + 0.1·graph`.
    pub fn fuse(content: f64, temporal: f64, user: f64, graph: f64) -> Self {
        Self {
            total: CONTENT_WEIGHT * content
                + TEMPORAL_WEIGHT * temporal
                + USER_WEIGHT * user
                + GRAPH_WEIGHT * graph,
            content,
            temporal,
            user,
            graph,
        }
    }
}

/// A candidate message with its scores.
#[derive(Debug, Clone)]
pub struct ScoredMessage {
    pub message_id: String,
    pub scores: Scores,
}

/// TF-IDF content scores over the candidate set implied by the query
/// tokens, normalized so the best match scores exactly 1.0.
///
/// Per message: `Σ tf[term]·idf[term]` over tokens present in its TF map,
/// plus `0.5·idf[term]` when the term also appears in the subject. The
/// smoothed IDF is strictly positive for indexed terms, so whenever any
/// candidate matches, the top match normalizes to exactly 1.0.
pub fn content_scores(index: &SearchIndex, tokens: &[String]) -> HashMap<String, f64> {
    let mut raw: HashMap<String, f64> = HashMap::new();

    for token in tokens {
        let Some(docs) = index.postings.get(token) else {
            continue;
        };
        let idf = index.idf(token);
        for (message_id, tf) in docs {
            let mut score = tf * idf;
            if index
                .subject_terms
                .get(message_id)
                .is_some_and(|terms| terms.contains(token))
            {
                score += SUBJECT_BONUS * idf;
            }
            *raw.entry(message_id.clone()).or_default() += score;
        }
    }

    let max = raw.values().cloned().fold(0.0_f64, f64::max);
    if max > 0.0 {
        for value in raw.values_mut() {
            *value /= max;
        }
    }
    raw
}

/// Temporal proximity for a date-range query:
/// `1 - |message_date - range_start| / range_length`, clamped at 0.
/// A zero-length range counts as one day, so an exact hit scores 1.0.
pub fn range_score(message_date: &str, from: NaiveDate, to: NaiveDate) -> f64 {
    let Some(dt) = parse_datetime(message_date) else {
        return 0.0;
    };
    let day = dt.date_naive();
    let distance = (day - from).num_days().unsigned_abs() as f64;
    let length = (to - from).num_days().max(1) as f64;
    (1.0 - distance / length).max(0.0)
}

/// Freshness bonus blended into content search: `exp(-days_old / 30)`.
pub fn freshness_score(message_date: &str) -> f64 {
    let Some(dt) = parse_datetime(message_date) else {
        return 0.0;
    };
    let days_old = (Utc::now() - dt).num_days().max(0) as f64;
    (-days_old / FRESHNESS_DECAY_DAYS).exp()
}

/// Fuzzy contact match against a user node.
///
/// Exact email or full-name match scores 1.0; email substring
/// containment 0.9; name substring containment 0.8; a bare first-name
/// match 0.85. Returns the best applicable score, 0.0 on no match.
pub fn user_match_score(query: &str, user: &UserNode) -> f64 {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return 0.0;
    }
    let email = user.email.to_lowercase();
    let name = user.display_name.to_lowercase();

    if query == email || (!name.is_empty() && query == name) {
        return 1.0;
    }
    if name.split_whitespace().next() == Some(query.as_str()) {
        return 0.85;
    }
    if email.contains(&query) || query.contains(&email) {
        return 0.9;
    }
    if !name.is_empty() && (name.contains(&query) || query.contains(&name)) {
        return 0.8;
    }
    0.0
}

/// Weight applied to a user match depending on the matched role.
pub fn role_weight(is_sender: bool) -> f64 {
    if is_sender {
        SENDER_ROLE_WEIGHT
    } else {
        RECIPIENT_ROLE_WEIGHT
    }
}

/// The sender's PageRank, 0.0 when the sender or their rank is unknown.
pub fn graph_score(store: &GraphStore, index: &SearchIndex, message_id: &str) -> f64 {
    let Some(message) = store.message(message_id) else {
        return 0.0;
    };
    if message.sender.is_empty() {
        return 0.0;
    }
    store
        .find_user_by_email(&message.sender)
        .and_then(|user_id| index.pagerank.get(user_id))
        .copied()
        .unwrap_or(0.0)
}

/// Order candidates: total descending, then graph score descending,
/// then message id ascending. Fully deterministic.
pub fn rank(mut results: Vec<ScoredMessage>) -> Vec<ScoredMessage> {
    results.sort_by(|a, b| {
        b.scores
            .total
            .partial_cmp(&a.scores.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                b.scores
                    .graph
                    .partial_cmp(&a.scores.graph)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then_with(|| a.message_id.cmp(&b.message_id))
    });
    results
}
