//! Graph builder: drives per-email processing over a batch of records.
//!
//! One malformed record never aborts the batch — per-record failures are
//! logged, counted into [`BuildStats`], and processing continues.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::model::address::split_address_list;
use crate::model::record::EmailRecord;

use super::messages::MessageManager;
use super::relations::{RecipientKind, RelationBuilder};
use super::store::GraphStore;
use super::threads::ThreadManager;
use super::users::UserManager;

/// Outcome of one batch build.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    pub emails_processed: usize,
    pub emails_successful: usize,
    pub emails_failed: usize,
}

impl BuildStats {
    /// Fraction of processed records that succeeded (1.0 for an empty batch).
    pub fn success_rate(&self) -> f64 {
        if self.emails_processed == 0 {
            return 1.0;
        }
        self.emails_successful as f64 / self.emails_processed as f64
    }
}

// Serialized by hand so `success_rate` shows up in JSON output without
// a stored field that could drift from the counters.
impl Serialize for BuildStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("BuildStats", 4)?;
        state.serialize_field("emails_processed", &self.emails_processed)?;
        state.serialize_field("emails_successful", &self.emails_successful)?;
        state.serialize_field("emails_failed", &self.emails_failed)?;
        state.serialize_field("success_rate", &self.success_rate())?;
        state.end()
    }
}

/// Coordinates the per-email pipeline: normalize → nodes → relations.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    messages: MessageManager,
    users: UserManager,
    threads: ThreadManager,
    relations: RelationBuilder,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a batch of records into the store.
    ///
    /// Sets the central user first (rejecting an invalid address),
    /// optionally truncates the batch to `max_emails`, ingests each
    /// record with per-record failure tolerance, then runs the
    /// thread-chain post-pass once over the whole graph.
    pub fn build(
        &mut self,
        store: &mut GraphStore,
        records: &[EmailRecord],
        central_user_email: &str,
        max_emails: Option<usize>,
    ) -> Result<BuildStats> {
        self.users.set_central_user(central_user_email)?;

        let batch = match max_emails {
            Some(max) => &records[..records.len().min(max)],
            None => records,
        };
        info!(
            total = records.len(),
            ingesting = batch.len(),
            central_user = central_user_email,
            "Building email graph"
        );

        let mut stats = BuildStats::default();
        for record in batch {
            stats.emails_processed += 1;
            match self.ingest_record(store, record) {
                Ok(()) => stats.emails_successful += 1,
                Err(e) => {
                    stats.emails_failed += 1;
                    warn!(error = %e, "Skipping record");
                }
            }
        }

        self.relations.link_thread_chains(store);

        info!(
            nodes = store.node_count(),
            edges = store.edge_count(),
            succeeded = stats.emails_successful,
            failed = stats.emails_failed,
            "Graph build complete"
        );
        Ok(stats)
    }

    /// The per-email pipeline. Skippable field problems (bad addresses,
    /// unparsable dates, missing thread id) degrade silently; only a
    /// missing message id fails the record.
    ///
    /// A duplicate message id re-links the same relations (weights
    /// accumulate) but leaves thread statistics untouched, keeping
    /// `message_count` equal to the number of distinct messages.
    fn ingest_record(&mut self, store: &mut GraphStore, record: &EmailRecord) -> Result<()> {
        let already_present = store.has_node(record.message_id.trim());
        let message_id = self
            .messages
            .create_message(store, record)
            .ok_or_else(|| EngineError::record(None, "missing message id"))?;

        if !already_present {
            self.threads.get_or_create_thread(store, record);
        }

        let sender_id = self.users.get_or_create(store, &record.from);
        if let Some(sender) = &sender_id {
            self.relations.link_sender(store, sender, &message_id);
        } else {
            debug!(message_id = %message_id, "Record has no parseable sender");
        }

        for (field, kind) in [
            (&record.to, RecipientKind::To),
            (&record.cc, RecipientKind::Cc),
            (&record.bcc, RecipientKind::Bcc),
        ] {
            for raw in split_address_list(field, ',') {
                let Some(recipient_id) = self.users.get_or_create(store, &raw) else {
                    debug!(message_id = %message_id, recipient = %raw, "Skipping invalid recipient");
                    continue;
                };
                self.relations.link_recipient(
                    store,
                    &message_id,
                    sender_id.as_deref(),
                    &recipient_id,
                    kind,
                );
            }
        }

        Ok(())
    }
}
