//! Thread node manager.
//!
//! Thread aggregation works on canonical date strings: ISO-8601 compares
//! lexicographically, and an empty (unparsable) date always sorts as
//! oldest, so `last_message_date` only ever moves forward.

use crate::model::address::{normalize_email, split_address_list};
use crate::model::node::{Node, ThreadNode};
use crate::model::record::EmailRecord;

use super::store::GraphStore;

/// Creates and updates thread nodes as messages arrive.
#[derive(Debug, Default)]
pub struct ThreadManager;

impl ThreadManager {
    pub fn new() -> Self {
        Self
    }

    /// Find or create the thread node for a record, returning its id.
    ///
    /// Returns `None` when the record carries no thread id. On update,
    /// increments the message count, unions participants and topics,
    /// and advances `last_message_date` when the new date is newer.
    /// `first_message_id` and `subject` come from the first message only.
    pub fn get_or_create_thread(
        &self,
        store: &mut GraphStore,
        record: &EmailRecord,
    ) -> Option<String> {
        let thread_id = record.thread_id.trim();
        if thread_id.is_empty() {
            return None;
        }

        let participants = record_participants(record);
        let date = record.thread_date();

        match store.thread_mut(thread_id) {
            Some(thread) => {
                thread.message_count += 1;
                if date > thread.last_message_date {
                    thread.last_message_date = date;
                }
                for p in participants {
                    if !thread.participants.contains(&p) {
                        thread.participants.push(p);
                    }
                }
                for t in &record.topics {
                    if !thread.topics.contains(t) {
                        thread.topics.push(t.clone());
                    }
                }
            }
            None => {
                store.insert_node(Node::Thread(ThreadNode {
                    id: thread_id.to_string(),
                    first_message_id: record.message_id.clone(),
                    subject: record.subject.clone(),
                    message_count: 1,
                    last_message_date: date,
                    participants: dedup_preserving_order(participants),
                    topics: dedup_preserving_order(record.topics.clone()),
                }));
            }
        }
        Some(thread_id.to_string())
    }
}

/// Sender + To + Cc of a record, normalized. Bcc stays out of the
/// participant set.
fn record_participants(record: &EmailRecord) -> Vec<String> {
    let mut out = Vec::new();
    let sender = normalize_email(&record.from);
    if !sender.is_empty() {
        out.push(sender);
    }
    for field in [&record.to, &record.cc] {
        for raw in split_address_list(field, ',') {
            let addr = normalize_email(&raw);
            if !addr.is_empty() {
                out.push(addr);
            }
        }
    }
    out
}

fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
