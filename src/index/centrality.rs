//! Graph centrality: PageRank over the user subgraph, degree centrality
//! over the full graph.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::graph::store::GraphStore;
use crate::model::node::EdgeKind;

const DAMPING: f64 = 0.85;
const TOLERANCE: f64 = 1e-6;
const MAX_ITERATIONS: usize = 100;

/// Weighted PageRank over the induced user-only subgraph (EMAILED,
/// EMAILED_CC, EMAILED_BCC edges).
///
/// Returns an empty map when there are no users or when the iteration
/// fails to converge — search then degrades user/graph scores to 0
/// instead of failing.
pub fn user_pagerank(store: &GraphStore) -> HashMap<String, f64> {
    let users = store.user_ids();
    let n = users.len();
    if n == 0 {
        return HashMap::new();
    }

    let position: HashMap<&str, usize> = users
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    // Outgoing contact edges per user, restricted to the user subgraph.
    let mut outgoing: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    let mut out_weight: Vec<f64> = vec![0.0; n];
    for (i, user_id) in users.iter().enumerate() {
        for (target, relation) in store.outgoing(user_id) {
            if !matches!(
                relation.kind,
                EdgeKind::Emailed | EdgeKind::EmailedCc | EdgeKind::EmailedBcc
            ) {
                continue;
            }
            if let Some(&j) = position.get(target) {
                outgoing[i].push((j, relation.weight));
                out_weight[i] += relation.weight;
            }
        }
    }

    let uniform = 1.0 / n as f64;
    let mut rank = vec![uniform; n];

    for iteration in 0..MAX_ITERATIONS {
        let mut next = vec![(1.0 - DAMPING) * uniform; n];

        // Dangling users spread their mass uniformly.
        let dangling: f64 = (0..n)
            .filter(|&i| out_weight[i] == 0.0)
            .map(|i| rank[i])
            .sum();
        let dangling_share = DAMPING * dangling * uniform;
        for value in next.iter_mut() {
            *value += dangling_share;
        }

        for i in 0..n {
            if out_weight[i] == 0.0 {
                continue;
            }
            let share = DAMPING * rank[i] / out_weight[i];
            for &(j, weight) in &outgoing[i] {
                next[j] += share * weight;
            }
        }

        let err: f64 = rank
            .iter()
            .zip(next.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        rank = next;

        if err < n as f64 * TOLERANCE {
            debug!(iterations = iteration + 1, users = n, "PageRank converged");
            return users.into_iter().zip(rank).collect();
        }
    }

    warn!(users = n, "PageRank did not converge; falling back to empty scores");
    HashMap::new()
}

/// In-degree + out-degree edge count per user, over the full graph
/// (message edges included), unnormalized.
pub fn degree_centrality(store: &GraphStore) -> HashMap<String, usize> {
    store
        .user_ids()
        .into_iter()
        .map(|id| {
            let d = store.degree(&id);
            (id, d)
        })
        .collect()
}
