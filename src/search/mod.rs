//! Search service: dispatches a structured query to one of four
//! retrieval strategies and returns ranked, enriched results.
//!
//! Every mode produces a candidate set with partial scores, runs the
//! shared attribute filter pass, fuses the four score components, and
//! hands the survivors to the result formatter.

pub mod filters;
pub mod query;
pub mod results;
pub mod scoring;

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::graph::store::GraphStore;
use crate::index::{tokenize, SearchIndex};
use crate::model::record::parse_datetime;

use self::filters::passes_filters;
use self::query::{MessageType, QueryType, SearchQuery};
use self::results::{format_results, SearchResult};
use self::scoring::{
    content_scores, freshness_score, graph_score, range_score, role_weight, user_match_score,
    ScoredMessage, Scores,
};

/// Partial scores accumulated per candidate before fusion.
#[derive(Debug, Clone, Copy, Default)]
struct Partials {
    content: f64,
    temporal: Option<f64>,
    user: f64,
}

/// Execute a structured query against a built graph and index.
///
/// `central_email` is the normalized mailbox owner (for sent/received
/// framing). Fails only on a completely empty query; malformed
/// mode-specific input degrades to an empty result set.
pub fn execute(
    store: &GraphStore,
    index: &SearchIndex,
    central_email: Option<&str>,
    search_query: &SearchQuery,
    default_limit: usize,
) -> Result<Vec<SearchResult>> {
    if search_query.is_empty() {
        return Err(EngineError::EmptyQuery);
    }

    let mode = search_query.effective_mode();
    debug!(?mode, text = %search_query.text, "Dispatching search");

    let candidates = match mode {
        QueryType::Content => content_candidates(store, index, search_query),
        QueryType::Temporal => temporal_candidates(store, index, search_query),
        QueryType::User => user_candidates(store, index, search_query),
        QueryType::Combined => combined_candidates(store, index, search_query),
    };

    let tokens = tokenize(&search_query.text);
    let matched_terms: Vec<String> = tokens
        .iter()
        .filter(|t| index.postings.contains_key(*t))
        .cloned()
        .collect();

    let mut scored = Vec::with_capacity(candidates.len());
    for (message_id, partials) in candidates {
        let Some(message) = store.message(&message_id) else {
            continue;
        };
        if !passes_filters(store, message, &search_query.filters, central_email) {
            continue;
        }
        let temporal = partials
            .temporal
            .unwrap_or_else(|| freshness_score(&message.date));
        let graph = graph_score(store, index, &message_id);
        scored.push(ScoredMessage {
            message_id,
            scores: Scores::fuse(partials.content, temporal, partials.user, graph),
        });
    }

    let limit = if search_query.limit == 0 {
        default_limit
    } else {
        search_query.limit
    };
    Ok(format_results(store, index, scored, &matched_terms, limit))
}

/// Content mode: TF-IDF candidates from the inverted index, freshness
/// as the temporal component. With no query text the candidate set is
/// every message — that is what lets pure attribute filters (including
/// boolean negations) scan the whole corpus.
fn content_candidates(
    store: &GraphStore,
    index: &SearchIndex,
    search_query: &SearchQuery,
) -> HashMap<String, Partials> {
    let tokens = tokenize(&search_query.text);
    if tokens.is_empty() {
        return store
            .message_ids()
            .into_iter()
            .map(|id| (id, Partials::default()))
            .collect();
    }
    content_scores(index, &tokens)
        .into_iter()
        .map(|(id, content)| {
            (
                id,
                Partials {
                    content,
                    ..Default::default()
                },
            )
        })
        .collect()
}

/// Temporal mode: day-bucket candidates scored by range proximity.
/// Missing `date_from` is a malformed temporal query and yields an
/// empty set rather than an error.
fn temporal_candidates(
    store: &GraphStore,
    index: &SearchIndex,
    search_query: &SearchQuery,
) -> HashMap<String, Partials> {
    let Some((from, to)) = parse_range(search_query) else {
        warn!("Temporal query without a parseable date_from; returning no results");
        return HashMap::new();
    };

    index
        .messages_in_range(from, to)
        .into_iter()
        .map(|id| {
            let temporal = store
                .message(&id)
                .map(|m| range_score(&m.date, from, to))
                .unwrap_or(0.0);
            (
                id,
                Partials {
                    temporal: Some(temporal),
                    ..Default::default()
                },
            )
        })
        .collect()
}

/// User mode: candidates from the sent/received indexes of every user
/// matching the contact filters, scored `match × PageRank × role`.
/// A message keeps the max of multiple qualifying matches.
fn user_candidates(
    store: &GraphStore,
    index: &SearchIndex,
    search_query: &SearchQuery,
) -> HashMap<String, Partials> {
    let filters = &search_query.filters;
    let mut partials: HashMap<String, Partials> = HashMap::new();

    let contact_needles: Vec<&str> = [&filters.contact_email, &filters.contact_name]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect();
    let recipient_needles: Vec<&str> = [&filters.recipient_email, &filters.recipient_name]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect();

    for user_id in store.user_ids() {
        let Some(user) = store.user(&user_id) else {
            continue;
        };
        let pagerank = index.pagerank.get(&user_id).copied().unwrap_or(0.0);

        let contact_match = contact_needles
            .iter()
            .map(|n| user_match_score(n, user))
            .fold(0.0_f64, f64::max);
        if contact_match > 0.0 {
            // Owner-received mail has the contact as its sender, so the
            // `received` framing draws on the contact's sent set (and
            // vice versa). Without a framing filter both sets apply.
            if filters.message_type != Some(MessageType::Sent) {
                accumulate_role(
                    &mut partials,
                    index.sent.get(&user_id),
                    contact_match * pagerank * role_weight(true),
                );
            }
            if filters.message_type != Some(MessageType::Received) {
                accumulate_role(
                    &mut partials,
                    index.received.get(&user_id),
                    contact_match * pagerank * role_weight(false),
                );
            }
        }

        let recipient_match = recipient_needles
            .iter()
            .map(|n| user_match_score(n, user))
            .fold(0.0_f64, f64::max);
        if recipient_match > 0.0 {
            accumulate_role(
                &mut partials,
                index.received.get(&user_id),
                recipient_match * pagerank * role_weight(false),
            );
        }
    }

    partials
}

fn accumulate_role(
    partials: &mut HashMap<String, Partials>,
    messages: Option<&HashSet<String>>,
    score: f64,
) {
    let Some(messages) = messages else {
        return;
    };
    for message_id in messages {
        let entry = partials.entry(message_id.clone()).or_default();
        entry.user = entry.user.max(score);
    }
}

/// Combined mode: every active retrieval signal contributes a candidate
/// set; two or more active signals intersect (precision over recall),
/// a single signal degrades to its own set.
fn combined_candidates(
    store: &GraphStore,
    index: &SearchIndex,
    search_query: &SearchQuery,
) -> HashMap<String, Partials> {
    let filters = &search_query.filters;
    let mut signal_sets: Vec<HashSet<String>> = Vec::new();

    let tokens = tokenize(&search_query.text);
    let content = if tokens.is_empty() {
        HashMap::new()
    } else {
        let scores = content_scores(index, &tokens);
        signal_sets.push(scores.keys().cloned().collect());
        scores
    };

    let contact = if filters.has_contact() {
        let scores = user_candidates(store, index, search_query);
        signal_sets.push(scores.keys().cloned().collect());
        scores
    } else {
        HashMap::new()
    };

    let temporal = if filters.has_date_range() {
        let scores = temporal_candidates(store, index, search_query);
        signal_sets.push(scores.keys().cloned().collect());
        scores
    } else {
        HashMap::new()
    };

    if !filters.topic_ids.is_empty() {
        let mut topical = HashSet::new();
        for id in store.message_ids() {
            if let Some(message) = store.message(&id) {
                if message.topics.iter().any(|t| filters.topic_ids.contains(t)) {
                    topical.insert(id);
                }
            }
        }
        signal_sets.push(topical);
    }

    let final_set: HashSet<String> = if signal_sets.len() >= 2 {
        // Intersection across all active signals.
        let mut iter = signal_sets.into_iter();
        let first = iter.next().unwrap_or_default();
        iter.fold(first, |acc, set| {
            acc.intersection(&set).cloned().collect()
        })
    } else {
        signal_sets.into_iter().next().unwrap_or_default()
    };

    final_set
        .into_iter()
        .map(|id| {
            let partial = Partials {
                content: content.get(&id).copied().unwrap_or(0.0),
                temporal: temporal.get(&id).and_then(|p| p.temporal),
                user: contact.get(&id).map(|p| p.user).unwrap_or(0.0),
            };
            (id, partial)
        })
        .collect()
}

/// Parse the inclusive date range; `date_to` defaults to today.
///
/// An unparseable `date_to` also falls back to today rather than
/// silently shrinking the range.
fn parse_range(search_query: &SearchQuery) -> Option<(NaiveDate, NaiveDate)> {
    let from = search_query
        .filters
        .date_from
        .as_deref()
        .and_then(parse_datetime)?
        .date_naive();
    let to = search_query
        .filters
        .date_to
        .as_deref()
        .and_then(parse_datetime)
        .map(|dt| dt.date_naive())
        .unwrap_or_else(|| Utc::now().date_naive());
    Some((from, to))
}
