//! The engine facade: owns the graph, the search index, and the
//! configured defaults, and exposes the build / search / snapshot
//! operations callers actually use.

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::graph::builder::BuildStats;
use crate::graph::snapshot::GraphSnapshot;
use crate::graph::store::GraphStore;
use crate::graph::GraphBuilder;
use crate::index::SearchIndex;
use crate::model::address::normalize_email;
use crate::model::record::EmailRecord;
use crate::search::query::SearchQuery;
use crate::search::results::SearchResult;

/// Coarse counts over the built graph.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EngineStats {
    pub messages: usize,
    pub users: usize,
    pub threads: usize,
    pub edges: usize,
}

/// An in-memory email graph with a derived search index.
///
/// Single-threaded by design: `build` replaces the graph wholesale and
/// the index is rebuilt from the finished graph, so searches only ever
/// see a complete, consistent pair.
pub struct EmailEngine {
    store: GraphStore,
    index: SearchIndex,
    central_email: Option<String>,
    config: Config,
}

impl EmailEngine {
    pub fn new(config: Config) -> Self {
        Self {
            store: GraphStore::new(),
            index: SearchIndex::default(),
            central_email: None,
            config,
        }
    }

    /// Ingest a batch of records into a fresh graph and rebuild the
    /// index. Any previous graph is discarded, even on failure.
    pub fn build(&mut self, records: &[EmailRecord], central_user: &str) -> Result<BuildStats> {
        self.store = GraphStore::new();
        self.index = SearchIndex::default();

        let mut builder = GraphBuilder::new();
        let stats = builder.build(
            &mut self.store,
            records,
            central_user,
            self.config.ingest.max_emails,
        )?;
        self.central_email = Some(normalize_email(central_user));
        self.index = SearchIndex::build(&self.store);

        info!(
            messages = self.store.message_ids().len(),
            users = self.store.user_ids().len(),
            threads = self.store.thread_ids().len(),
            edges = self.store.edge_count(),
            "Engine built"
        );
        Ok(stats)
    }

    /// Rebuild the index from the current graph. Cheap consistency
    /// lever after direct graph mutation.
    pub fn rebuild_index(&mut self) {
        self.index = SearchIndex::build(&self.store);
    }

    /// Execute a structured query against the built graph.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        crate::search::execute(
            &self.store,
            &self.index,
            self.central_email.as_deref(),
            query,
            self.config.search.default_limit,
        )
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            messages: self.store.message_ids().len(),
            users: self.store.user_ids().len(),
            threads: self.store.thread_ids().len(),
            edges: self.store.edge_count(),
        }
    }

    /// A serializable copy of the graph, for persistence.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::of(&self.store)
    }

    /// Replace the graph from a snapshot and rebuild the index. The
    /// central user is recovered from the snapshot's user nodes.
    pub fn load_snapshot(&mut self, snapshot: &GraphSnapshot) -> Result<()> {
        let store = snapshot.restore()?;
        self.central_email = store
            .user_ids()
            .into_iter()
            .filter_map(|id| store.user(&id).cloned())
            .find(|u| u.is_central_user)
            .map(|u| u.email);
        self.store = store;
        self.index = SearchIndex::build(&self.store);
        Ok(())
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn central_email(&self) -> Option<&str> {
        self.central_email.as_deref()
    }
}
