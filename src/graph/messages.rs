//! Message node manager.

use tracing::debug;

use crate::model::address::{normalize_email, split_address_list};
use crate::model::node::{MessageNode, Node};
use crate::model::record::EmailRecord;

use super::store::GraphStore;

/// Creates message nodes from email records.
#[derive(Debug, Default)]
pub struct MessageManager;

impl MessageManager {
    pub fn new() -> Self {
        Self
    }

    /// Create the message node for a record, returning its id.
    ///
    /// Returns `None` when the record has no message id. Idempotent:
    /// if the id already exists the existing node is kept untouched and
    /// the new record's attributes — date and subject included — are
    /// discarded (first write wins).
    pub fn create_message(&self, store: &mut GraphStore, record: &EmailRecord) -> Option<String> {
        let id = record.message_id.trim();
        if id.is_empty() {
            debug!("Skipping record without message id");
            return None;
        }
        if store.has_node(id) {
            debug!(message_id = id, "Message already present; keeping first write");
            return Some(id.to_string());
        }

        let attachment_types: Vec<String> = record
            .attachments
            .iter()
            .map(|a| a.file_type())
            .filter(|t| !t.is_empty())
            .collect();

        let node = MessageNode {
            id: id.to_string(),
            thread_id: record.thread_id.trim().to_string(),
            date: record.canonical_date(),
            subject: record.subject.clone(),
            body: record.body.clone(),
            sender: normalize_email(&record.from),
            to: normalize_recipients(&record.to),
            cc: normalize_recipients(&record.cc),
            bcc: normalize_recipients(&record.bcc),
            has_attachments: !record.attachments.is_empty(),
            attachment_count: record.attachments.len(),
            attachment_types,
            is_important: record.is_important,
            is_unread: record.is_unread,
            is_archived: record.is_archived,
            labels: record.labels.clone(),
            categories: record.categories.clone(),
            topics: record.topics.clone(),
            snippet: record.snippet.clone(),
        };
        store.insert_node(Node::Message(node));
        Some(id.to_string())
    }
}

/// Split a comma-joined header field and normalize each entry,
/// dropping entries that do not normalize to a valid address.
/// No cross-field or in-field deduplication.
fn normalize_recipients(raw: &str) -> Vec<String> {
    split_address_list(raw, ',')
        .iter()
        .map(|r| normalize_email(r))
        .filter(|a| !a.is_empty())
        .collect()
}
