//! The in-memory directed multigraph of messages, users, and threads.
//!
//! Nodes live in a petgraph arena; three auxiliary maps keep lookups O(1):
//! external id → node index, normalized email → user id, and
//! `(source, target, kind)` → edge index. The last one is what makes the
//! multigraph behave per policy: a second edge of the *same* kind between
//! the same ordered pair accumulates weight instead of duplicating, while
//! edges of different kinds coexist.
//!
//! Not thread-safe — all mutation is single-threaded; parallel ingestion
//! requires separate stores.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::Direction;
use tracing::debug;

use crate::model::node::{EdgeKind, MessageNode, Node, Relation, ThreadNode, UserNode};

/// The shared graph store. All node/edge mutation goes through here.
#[derive(Debug, Default)]
pub struct GraphStore {
    graph: DiGraph<Node, Relation>,
    /// External id → arena index.
    ids: HashMap<String, NodeIndex>,
    /// Normalized email → user node id. Rebuilt on reset.
    users_by_email: HashMap<String, String>,
    /// Same-kind edge dedup: ordered pair + kind → existing edge.
    edge_lookup: HashMap<(NodeIndex, NodeIndex, EdgeKind), EdgeIndex>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard every node, edge, and auxiliary map atomically.
    pub fn reset(&mut self) {
        self.graph.clear();
        self.ids.clear();
        self.users_by_email.clear();
        self.edge_lookup.clear();
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// Insert a node, overwriting any node with the same external id.
    ///
    /// The store does not auto-merge: callers that want create-or-get
    /// semantics (the node managers) check existence first.
    pub fn insert_node(&mut self, node: Node) {
        let id = node.id().to_string();
        if let Node::User(u) = &node {
            self.users_by_email.insert(u.email.clone(), u.id.clone());
        }
        match self.ids.get(&id) {
            Some(&idx) => {
                self.graph[idx] = node;
            }
            None => {
                let idx = self.graph.add_node(node);
                self.ids.insert(id, idx);
            }
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.ids.get(id).map(|&idx| &self.graph[idx])
    }

    pub fn message(&self, id: &str) -> Option<&MessageNode> {
        self.node(id).and_then(Node::as_message)
    }

    pub fn user(&self, id: &str) -> Option<&UserNode> {
        self.node(id).and_then(Node::as_user)
    }

    pub fn thread(&self, id: &str) -> Option<&ThreadNode> {
        self.node(id).and_then(Node::as_thread)
    }

    pub fn user_mut(&mut self, id: &str) -> Option<&mut UserNode> {
        let idx = *self.ids.get(id)?;
        match &mut self.graph[idx] {
            Node::User(u) => Some(u),
            _ => None,
        }
    }

    pub fn thread_mut(&mut self, id: &str) -> Option<&mut ThreadNode> {
        let idx = *self.ids.get(id)?;
        match &mut self.graph[idx] {
            Node::Thread(t) => Some(t),
            _ => None,
        }
    }

    /// O(1) user lookup by normalized email.
    pub fn find_user_by_email(&self, email: &str) -> Option<&str> {
        self.users_by_email.get(email).map(String::as_str)
    }

    /// Add a typed, weighted edge.
    ///
    /// If an edge of the same kind already exists between this ordered
    /// pair, its weight is increased by `weight` instead of inserting a
    /// duplicate. Self-loops and edges touching unknown ids are silently
    /// rejected (logged at debug).
    pub fn add_edge(&mut self, source: &str, target: &str, kind: EdgeKind, weight: f64) {
        if source == target {
            debug!(node = source, ?kind, "Rejecting self-loop edge");
            return;
        }
        let (Some(&src), Some(&dst)) = (self.ids.get(source), self.ids.get(target)) else {
            debug!(source, target, ?kind, "Rejecting edge with unknown endpoint");
            return;
        };

        match self.edge_lookup.get(&(src, dst, kind)) {
            Some(&existing) => {
                self.graph[existing].weight += weight;
            }
            None => {
                let idx = self.graph.add_edge(src, dst, Relation { kind, weight });
                self.edge_lookup.insert((src, dst, kind), idx);
            }
        }
    }

    /// Weight of the edge of `kind` between an ordered pair, if present.
    pub fn edge_weight(&self, source: &str, target: &str, kind: EdgeKind) -> Option<f64> {
        let (&src, &dst) = (self.ids.get(source)?, self.ids.get(target)?);
        self.edge_lookup
            .get(&(src, dst, kind))
            .map(|&e| self.graph[e].weight)
    }

    /// Outgoing relations of a node as `(target_id, relation)`.
    pub fn outgoing(&self, id: &str) -> impl Iterator<Item = (&str, &Relation)> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Incoming relations of a node as `(source_id, relation)`.
    pub fn incoming(&self, id: &str) -> impl Iterator<Item = (&str, &Relation)> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &str, dir: Direction) -> impl Iterator<Item = (&str, &Relation)> {
        use petgraph::visit::EdgeRef;
        self.ids.get(id).into_iter().flat_map(move |&idx| {
            self.graph.edges_directed(idx, dir).map(move |edge| {
                let other = match dir {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                (self.graph[other].id(), edge.weight())
            })
        })
    }

    /// Total in+out edge count of a node over the full graph.
    pub fn degree(&self, id: &str) -> usize {
        match self.ids.get(id) {
            Some(&idx) => {
                self.graph.edges_directed(idx, Direction::Incoming).count()
                    + self.graph.edges_directed(idx, Direction::Outgoing).count()
            }
            None => 0,
        }
    }

    /// Every edge in the graph as `(source_id, target_id, relation)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &Relation)> {
        use petgraph::visit::EdgeRef;
        self.graph.edge_references().map(|edge| {
            (
                self.graph[edge.source()].id(),
                self.graph[edge.target()].id(),
                edge.weight(),
            )
        })
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    pub fn message_ids(&self) -> Vec<String> {
        self.ids_of(|n| n.as_message().is_some())
    }

    pub fn user_ids(&self) -> Vec<String> {
        self.ids_of(|n| n.as_user().is_some())
    }

    pub fn thread_ids(&self) -> Vec<String> {
        self.ids_of(|n| n.as_thread().is_some())
    }

    fn ids_of(&self, keep: impl Fn(&Node) -> bool) -> Vec<String> {
        self.graph
            .node_weights()
            .filter(|n| keep(n))
            .map(|n| n.id().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, email: &str) -> Node {
        Node::User(UserNode {
            id: id.to_string(),
            email: email.to_string(),
            ..Default::default()
        })
    }

    fn message(id: &str) -> Node {
        Node::Message(MessageNode {
            id: id.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut store = GraphStore::new();
        store.insert_node(user("user-1", "a@x.com"));
        assert!(store.has_node("user-1"));
        assert_eq!(store.find_user_by_email("a@x.com"), Some("user-1"));
        assert!(store.find_user_by_email("b@x.com").is_none());
    }

    #[test]
    fn test_same_kind_edge_accumulates_weight() {
        let mut store = GraphStore::new();
        store.insert_node(user("user-1", "a@x.com"));
        store.insert_node(message("m1"));

        store.add_edge("user-1", "m1", EdgeKind::Sent, 3.0);
        store.add_edge("user-1", "m1", EdgeKind::Sent, 3.0);

        assert_eq!(store.edge_count(), 1);
        assert_eq!(store.edge_weight("user-1", "m1", EdgeKind::Sent), Some(6.0));
    }

    #[test]
    fn test_different_kinds_coexist() {
        let mut store = GraphStore::new();
        store.insert_node(user("user-1", "a@x.com"));
        store.insert_node(message("m1"));

        store.add_edge("user-1", "m1", EdgeKind::Sent, 1.0);
        store.add_edge("m1", "user-1", EdgeKind::Received, 1.0);
        store.add_edge("m1", "user-1", EdgeKind::Cc, 0.8);

        assert_eq!(store.edge_count(), 3);
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut store = GraphStore::new();
        store.insert_node(user("user-1", "a@x.com"));
        store.add_edge("user-1", "user-1", EdgeKind::Emailed, 1.0);
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn test_unknown_endpoint_rejected() {
        let mut store = GraphStore::new();
        store.insert_node(user("user-1", "a@x.com"));
        store.add_edge("user-1", "ghost", EdgeKind::Emailed, 1.0);
        store.add_edge("ghost", "user-1", EdgeKind::Emailed, 1.0);
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn test_direction_iteration() {
        let mut store = GraphStore::new();
        store.insert_node(user("user-1", "a@x.com"));
        store.insert_node(message("m1"));
        store.add_edge("user-1", "m1", EdgeKind::Sent, 1.0);

        let out: Vec<_> = store.outgoing("user-1").collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, "m1");
        assert_eq!(out[0].1.kind, EdgeKind::Sent);

        let inc: Vec<_> = store.incoming("m1").collect();
        assert_eq!(inc.len(), 1);
        assert_eq!(inc[0].0, "user-1");

        assert_eq!(store.degree("m1"), 1);
        assert_eq!(store.degree("user-1"), 1);
    }

    #[test]
    fn test_reset_clears_email_lookup() {
        let mut store = GraphStore::new();
        store.insert_node(user("user-1", "a@x.com"));
        store.reset();
        assert_eq!(store.node_count(), 0);
        assert!(store.find_user_by_email("a@x.com").is_none());
    }

    #[test]
    fn test_typed_id_listings() {
        let mut store = GraphStore::new();
        store.insert_node(user("user-1", "a@x.com"));
        store.insert_node(message("m1"));
        store.insert_node(message("m2"));
        assert_eq!(store.message_ids().len(), 2);
        assert_eq!(store.user_ids(), vec!["user-1".to_string()]);
        assert!(store.thread_ids().is_empty());
    }
}
