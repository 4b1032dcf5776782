//! Result formatter: enriches scored message ids into full result
//! records and applies the final rank/truncate.

use std::collections::HashSet;

use serde::Serialize;

use crate::graph::store::GraphStore;
use crate::index::SearchIndex;

use super::scoring::{rank, Scores, ScoredMessage};

/// Words of context kept on each side of the first matched term.
const SNIPPET_CONTEXT_WORDS: usize = 12;

/// One ranked search result, ready for the caller to serialize.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub message_id: String,
    pub thread_id: String,
    pub scores: Scores,
    pub subject: String,
    pub sender: SenderInfo,
    pub recipients: RecipientLists,
    pub date: String,
    pub attributes: MessageAttributes,
    pub thread_info: ThreadInfo,
    pub snippet: String,
    pub matched_terms: Vec<String>,
}

/// The resolved sender, from the graph's user node when one exists.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SenderInfo {
    pub email: String,
    pub name: String,
    /// The sender's PageRank (0.0 when unknown).
    pub centrality: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RecipientLists {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageAttributes {
    pub has_attachments: bool,
    pub is_important: bool,
    pub is_unread: bool,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ThreadInfo {
    /// Number of messages in the containing thread (0 without a thread).
    pub size: usize,
}

/// Rank scored candidates, enrich the top `limit`, and return them.
pub fn format_results(
    store: &GraphStore,
    index: &SearchIndex,
    scored: Vec<ScoredMessage>,
    matched_terms: &[String],
    limit: usize,
) -> Vec<SearchResult> {
    let term_set: HashSet<String> = matched_terms.iter().cloned().collect();
    rank(scored)
        .into_iter()
        .take(limit)
        .filter_map(|candidate| enrich(store, index, candidate, matched_terms, &term_set))
        .collect()
}

fn enrich(
    store: &GraphStore,
    index: &SearchIndex,
    candidate: ScoredMessage,
    matched_terms: &[String],
    term_set: &HashSet<String>,
) -> Option<SearchResult> {
    let message = store.message(&candidate.message_id)?;

    let sender = match store
        .find_user_by_email(&message.sender)
        .and_then(|id| store.user(id).map(|u| (id, u)))
    {
        Some((user_id, user)) => SenderInfo {
            email: user.email.clone(),
            name: user.display_name.clone(),
            centrality: index.pagerank.get(user_id).copied().unwrap_or(0.0),
        },
        None => SenderInfo {
            email: message.sender.clone(),
            ..Default::default()
        },
    };

    let thread_size = if message.thread_id.is_empty() {
        0
    } else {
        index
            .thread_messages
            .get(&message.thread_id)
            .map(HashSet::len)
            .or_else(|| store.thread(&message.thread_id).map(|t| t.message_count))
            .unwrap_or(0)
    };

    let source_text = if message.snippet.is_empty() {
        &message.body
    } else {
        &message.snippet
    };

    Some(SearchResult {
        message_id: candidate.message_id,
        thread_id: message.thread_id.clone(),
        scores: candidate.scores,
        subject: message.subject.clone(),
        sender,
        recipients: RecipientLists {
            to: message.to.clone(),
            cc: message.cc.clone(),
            bcc: message.bcc.clone(),
        },
        date: message.date.clone(),
        attributes: MessageAttributes {
            has_attachments: message.has_attachments,
            is_important: message.is_important,
            is_unread: message.is_unread,
            labels: message.labels.clone(),
        },
        thread_info: ThreadInfo { size: thread_size },
        snippet: snippet_around_match(source_text, term_set),
        matched_terms: matched_terms.to_vec(),
    })
}

/// Build a short snippet centered on the first matched term, with every
/// matched term wrapped in brackets. Without a match (or without terms)
/// the snippet is just the leading words.
fn snippet_around_match(text: &str, terms: &HashSet<String>) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return String::new();
    }

    let first_hit = words.iter().position(|w| terms.contains(&normalize_word(w)));

    let (start, end) = match first_hit {
        Some(hit) => (
            hit.saturating_sub(SNIPPET_CONTEXT_WORDS),
            (hit + SNIPPET_CONTEXT_WORDS + 1).min(words.len()),
        ),
        None => (0, (2 * SNIPPET_CONTEXT_WORDS).min(words.len())),
    };

    let mut out = String::new();
    if start > 0 {
        out.push_str("… ");
    }
    let rendered: Vec<String> = words[start..end]
        .iter()
        .map(|w| {
            if terms.contains(&normalize_word(w)) {
                format!("[{w}]")
            } else {
                (*w).to_string()
            }
        })
        .collect();
    out.push_str(&rendered.join(" "));
    if end < words.len() {
        out.push_str(" …");
    }
    out
}

fn normalize_word(word: &str) -> String {
    word.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}
