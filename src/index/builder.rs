//! Single-pass search index builder.
//!
//! Scans every message node once and produces the inverted text index
//! (normalized TF per document, DF per corpus, IDF at the end), the
//! temporal bucket indexes (day / ISO week / month), the user sent and
//! received indexes, the thread membership index, and graph centrality
//! scores. Rebuilt in full whenever the graph is rebuilt — there is no
//! incremental maintenance.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::Datelike;
use tracing::{debug, info};

use crate::graph::store::GraphStore;
use crate::model::node::EdgeKind;
use crate::model::record::parse_datetime;

use super::centrality;

/// All indexes the search layer reads. Opaque to callers of the engine.
#[derive(Debug, Default)]
pub struct SearchIndex {
    /// Number of indexed messages.
    pub total_messages: usize,
    /// term → message id → TF normalized by the document's max term count.
    pub postings: HashMap<String, HashMap<String, f64>>,
    /// term → number of documents containing it.
    pub doc_freq: HashMap<String, usize>,
    /// term → smoothed IDF, `ln((1 + total) / (1 + df)) + 1`. Strictly
    /// positive for every indexed term, so a term occurring in every
    /// document of a small corpus still produces a usable score.
    pub idf: HashMap<String, f64>,
    /// message id → tokens occurring in the subject (for the subject bonus).
    pub subject_terms: HashMap<String, HashSet<String>>,
    /// `YYYY-MM-DD` → message ids.
    pub by_day: HashMap<String, BTreeSet<String>>,
    /// `YYYY-W##` (ISO week) → message ids.
    pub by_week: HashMap<String, BTreeSet<String>>,
    /// `YYYY-MM` → message ids.
    pub by_month: HashMap<String, BTreeSet<String>>,
    /// user id → ids of messages they sent.
    pub sent: HashMap<String, HashSet<String>>,
    /// user id → ids of messages they received (To, Cc, or Bcc).
    pub received: HashMap<String, HashSet<String>>,
    /// thread id → member message ids.
    pub thread_messages: HashMap<String, HashSet<String>>,
    /// user id → PageRank over the user subgraph (empty on degeneracy).
    pub pagerank: HashMap<String, f64>,
    /// user id → in+out edge count over the full graph.
    pub degree: HashMap<String, usize>,
}

impl SearchIndex {
    /// Build every index in one pass over the graph.
    pub fn build(store: &GraphStore) -> Self {
        let mut index = SearchIndex::default();

        for message_id in store.message_ids() {
            let Some(message) = store.message(&message_id) else {
                continue;
            };
            index.total_messages += 1;

            index.index_text(&message_id, &message.subject, &message.body);
            index.index_date(&message_id, &message.date);
        }

        index.finish_idf();
        index.index_edges(store);
        index.pagerank = centrality::user_pagerank(store);
        index.degree = centrality::degree_centrality(store);

        info!(
            messages = index.total_messages,
            terms = index.postings.len(),
            users_ranked = index.pagerank.len(),
            "Search index built"
        );
        index
    }

    /// Normalized term frequency of `term` in a message, 0.0 if absent.
    pub fn tf(&self, term: &str, message_id: &str) -> f64 {
        self.postings
            .get(term)
            .and_then(|docs| docs.get(message_id))
            .copied()
            .unwrap_or(0.0)
    }

    /// IDF of a term, 0.0 for unknown terms.
    pub fn idf(&self, term: &str) -> f64 {
        self.idf.get(term).copied().unwrap_or(0.0)
    }

    /// Message ids whose date falls in `[from, to]` (inclusive),
    /// collected from the day buckets.
    pub fn messages_in_range(
        &self,
        from: chrono::NaiveDate,
        to: chrono::NaiveDate,
    ) -> HashSet<String> {
        let mut out = HashSet::new();
        let mut day = from;
        while day <= to {
            if let Some(ids) = self.by_day.get(&day.format("%Y-%m-%d").to_string()) {
                out.extend(ids.iter().cloned());
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        out
    }

    fn index_text(&mut self, message_id: &str, subject: &str, body: &str) {
        let tokens = tokenize(&format!("{subject} {body}"));
        if tokens.is_empty() {
            return;
        }

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for token in &tokens {
            *counts.entry(token.as_str()).or_default() += 1;
        }
        let max_count = counts.values().copied().max().unwrap_or(1) as f64;

        for (token, count) in counts {
            self.postings
                .entry(token.to_string())
                .or_default()
                .insert(message_id.to_string(), count as f64 / max_count);
            *self.doc_freq.entry(token.to_string()).or_default() += 1;
        }

        let subject_tokens: HashSet<String> = tokenize(subject).into_iter().collect();
        if !subject_tokens.is_empty() {
            self.subject_terms
                .insert(message_id.to_string(), subject_tokens);
        }
    }

    fn index_date(&mut self, message_id: &str, date: &str) {
        let Some(dt) = parse_datetime(date) else {
            // Messages without a parseable date stay out of the temporal
            // index; that is expected, not an error.
            if !date.is_empty() {
                debug!(message_id, date, "Unparsable canonical date");
            }
            return;
        };
        let naive = dt.date_naive();
        let day = naive.format("%Y-%m-%d").to_string();
        let iso = naive.iso_week();
        let week = format!("{}-W{:02}", iso.year(), iso.week());
        let month = naive.format("%Y-%m").to_string();

        self.by_day.entry(day).or_default().insert(message_id.to_string());
        self.by_week.entry(week).or_default().insert(message_id.to_string());
        self.by_month.entry(month).or_default().insert(message_id.to_string());
    }

    fn finish_idf(&mut self) {
        if self.total_messages == 0 {
            return;
        }
        let total = self.total_messages as f64;
        self.idf = self
            .doc_freq
            .iter()
            .map(|(term, &df)| {
                let idf = ((1.0 + total) / (1.0 + df as f64)).ln() + 1.0;
                (term.clone(), idf)
            })
            .collect();
    }

    fn index_edges(&mut self, store: &GraphStore) {
        for (source, target, relation) in store.edges() {
            match relation.kind {
                EdgeKind::Sent => {
                    // user → message
                    self.sent
                        .entry(source.to_string())
                        .or_default()
                        .insert(target.to_string());
                }
                EdgeKind::Received | EdgeKind::Cc | EdgeKind::Bcc => {
                    // message → user
                    self.received
                        .entry(target.to_string())
                        .or_default()
                        .insert(source.to_string());
                }
                EdgeKind::PartOfThread => {
                    // message → thread
                    self.thread_messages
                        .entry(target.to_string())
                        .or_default()
                        .insert(source.to_string());
                }
                _ => {}
            }
        }
    }
}

/// Tokenize text for the inverted index: lowercase runs of Unicode
/// letters/digits, keeping tokens of length ≥ 3.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 3)
        .map(String::from)
        .collect()
}
