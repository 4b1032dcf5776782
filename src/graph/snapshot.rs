//! Lossless graph snapshot for external persistence.
//!
//! The engine itself never touches disk; callers that want a JSON dump
//! serialize a [`GraphSnapshot`] with serde and restore it later. Node
//! attributes and edge kind/weight round-trip exactly.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::model::node::{EdgeKind, Node};

use super::store::GraphStore;

/// A flat, serializable copy of the whole graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<SnapshotEdge>,
}

/// One edge in the snapshot, by external node ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    pub weight: f64,
}

impl GraphSnapshot {
    /// Capture the current graph.
    pub fn of(store: &GraphStore) -> Self {
        let nodes = store.nodes().cloned().collect();
        let edges = store
            .edges()
            .map(|(source, target, relation)| SnapshotEdge {
                source: source.to_string(),
                target: target.to_string(),
                kind: relation.kind,
                weight: relation.weight,
            })
            .collect();
        Self { nodes, edges }
    }

    /// Rebuild a store from this snapshot.
    ///
    /// Fails on duplicate node ids or edges referencing unknown nodes —
    /// a snapshot produced by [`GraphSnapshot::of`] always restores.
    pub fn restore(&self) -> Result<GraphStore> {
        let mut store = GraphStore::new();
        for node in &self.nodes {
            if store.has_node(node.id()) {
                return Err(EngineError::InvalidSnapshot(format!(
                    "duplicate node id '{}'",
                    node.id()
                )));
            }
            store.insert_node(node.clone());
        }
        for edge in &self.edges {
            if !store.has_node(&edge.source) || !store.has_node(&edge.target) {
                return Err(EngineError::InvalidSnapshot(format!(
                    "edge {} -> {} references a missing node",
                    edge.source, edge.target
                )));
            }
            store.add_edge(&edge.source, &edge.target, edge.kind, edge.weight);
        }
        Ok(store)
    }
}
