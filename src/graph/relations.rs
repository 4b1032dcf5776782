//! Relation builder: typed, weighted edges between the nodes of one
//! email, plus the thread-chain post-pass.
//!
//! Per-email edges (SENT, RECEIVED/CC/BCC, EMAILED*) are created during
//! ingestion. PART_OF_THREAD and REPLIED_TO are created afterwards in a
//! single pass over the finished graph: REPLIED_TO links each message to
//! its chronological predecessor, which is only known once every message
//! of a thread has arrived.

use std::collections::HashMap;

use tracing::debug;

use crate::model::node::EdgeKind;

use super::store::GraphStore;

/// Which recipient header a user appeared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientKind {
    To,
    Cc,
    Bcc,
}

impl RecipientKind {
    /// The message→user edge for this header.
    pub fn message_edge(self) -> EdgeKind {
        match self {
            RecipientKind::To => EdgeKind::Received,
            RecipientKind::Cc => EdgeKind::Cc,
            RecipientKind::Bcc => EdgeKind::Bcc,
        }
    }

    /// The user→user aggregate edge for this header.
    pub fn contact_edge(self) -> EdgeKind {
        match self {
            RecipientKind::To => EdgeKind::Emailed,
            RecipientKind::Cc => EdgeKind::EmailedCc,
            RecipientKind::Bcc => EdgeKind::EmailedBcc,
        }
    }
}

/// Builds inter-node edges and maintains connection-strength counters.
#[derive(Debug, Default)]
pub struct RelationBuilder;

impl RelationBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Create the SENT edge (user → message).
    pub fn link_sender(&self, store: &mut GraphStore, sender_id: &str, message_id: &str) {
        let is_central = store
            .user(sender_id)
            .map(|u| u.is_central_user)
            .unwrap_or(false);
        store.add_edge(
            sender_id,
            message_id,
            EdgeKind::Sent,
            EdgeKind::sent_weight(is_central),
        );
    }

    /// Create the message↔user edge for one recipient and — when the
    /// sender is known — the user↔user aggregate edge, then update
    /// connection strength for that interaction.
    pub fn link_recipient(
        &self,
        store: &mut GraphStore,
        message_id: &str,
        sender_id: Option<&str>,
        recipient_id: &str,
        kind: RecipientKind,
    ) {
        let message_edge = kind.message_edge();
        store.add_edge(
            message_id,
            recipient_id,
            message_edge,
            message_edge.recipient_weight(),
        );

        let Some(sender_id) = sender_id else {
            return;
        };
        if sender_id == recipient_id {
            // Self-addressed mail: the store would reject the loop anyway.
            return;
        }

        let sender_is_central = store
            .user(sender_id)
            .map(|u| u.is_central_user)
            .unwrap_or(false);
        let contact_edge = kind.contact_edge();
        let weight = contact_edge.contact_weight(sender_is_central);
        store.add_edge(sender_id, recipient_id, contact_edge, weight);
        self.update_connection_strength(store, sender_id, recipient_id, weight);
    }

    /// Increment connection strength for one interaction of weight `w`.
    ///
    /// Exactly one endpoint must be the central user; the *other* side's
    /// counter grows by `w`. The central user's own counter never moves,
    /// and nothing happens when neither side is central.
    fn update_connection_strength(
        &self,
        store: &mut GraphStore,
        a_id: &str,
        b_id: &str,
        weight: f64,
    ) {
        let a_central = store.user(a_id).map(|u| u.is_central_user).unwrap_or(false);
        let b_central = store.user(b_id).map(|u| u.is_central_user).unwrap_or(false);

        let other = match (a_central, b_central) {
            (true, false) => b_id,
            (false, true) => a_id,
            _ => return,
        };
        if let Some(user) = store.user_mut(other) {
            user.connection_strength += weight;
        }
    }

    /// Post-ingestion pass: PART_OF_THREAD and REPLIED_TO edges.
    ///
    /// Messages of each thread are sorted by (date, message id) — the id
    /// tie-break keeps the chain deterministic when dates collide or are
    /// missing — then each message is linked to its thread and to its
    /// predecessor.
    pub fn link_thread_chains(&self, store: &mut GraphStore) {
        let mut by_thread: HashMap<String, Vec<(String, String)>> = HashMap::new();
        for id in store.message_ids() {
            let Some(message) = store.message(&id) else {
                continue;
            };
            if message.thread_id.is_empty() {
                continue;
            }
            by_thread
                .entry(message.thread_id.clone())
                .or_default()
                .push((message.date.clone(), id));
        }

        for (thread_id, mut members) in by_thread {
            if !store.has_node(&thread_id) {
                debug!(thread_id = %thread_id, "Thread node missing; skipping chain pass");
                continue;
            }
            members.sort();

            for (_, message_id) in &members {
                store.add_edge(message_id, &thread_id, EdgeKind::PartOfThread, 1.0);
            }
            for pair in members.windows(2) {
                let (_, previous) = &pair[0];
                let (_, current) = &pair[1];
                store.add_edge(current, previous, EdgeKind::RepliedTo, 1.0);
            }
        }
    }
}
