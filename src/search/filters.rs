//! Shared attribute filter pass.
//!
//! Every retrieval mode runs its candidates through this exact chain,
//! cheapest checks first. Boolean negation filters (for example
//! `has_attachments: false`) work because content mode with no query
//! text starts from the full message set rather than a positive index.

use crate::graph::store::GraphStore;
use crate::model::node::MessageNode;

use super::query::{MessageType, SearchFilters};
use super::scoring::user_match_score;

/// Check whether a message passes every populated filter.
///
/// `central_email` (the mailbox owner, normalized) is needed for the
/// `message_type` sent/received framing.
pub fn passes_filters(
    store: &GraphStore,
    message: &MessageNode,
    filters: &SearchFilters,
    central_email: Option<&str>,
) -> bool {
    if let Some(want) = filters.has_attachments {
        if message.has_attachments != want {
            return false;
        }
    }
    if let Some(want) = filters.is_unread {
        if message.is_unread != want {
            return false;
        }
    }
    if let Some(want) = filters.is_important {
        if message.is_important != want {
            return false;
        }
    }
    if let Some(want) = filters.is_archived {
        if message.is_archived != want {
            return false;
        }
    }

    if !filters.attachment_types.is_empty() {
        let allowed: Vec<String> = filters
            .attachment_types
            .iter()
            .map(|t| t.to_lowercase())
            .collect();
        if !message
            .attachment_types
            .iter()
            .any(|t| allowed.contains(t))
        {
            return false;
        }
    }

    if !filters.topic_ids.is_empty()
        && !message.topics.iter().any(|t| filters.topic_ids.contains(t))
    {
        return false;
    }

    if let Some(message_type) = filters.message_type {
        if !matches_message_type(message, message_type, central_email) {
            return false;
        }
    }

    // Contact filters double as attribute filters: the sender or a
    // recipient must match, resolved through the graph's user nodes.
    for needle in [&filters.contact_email, &filters.contact_name]
        .into_iter()
        .flatten()
    {
        if !matches_participant(store, message, needle, true) {
            return false;
        }
    }
    for needle in [&filters.recipient_email, &filters.recipient_name]
        .into_iter()
        .flatten()
    {
        if !matches_participant(store, message, needle, false) {
            return false;
        }
    }

    true
}

fn matches_message_type(
    message: &MessageNode,
    message_type: MessageType,
    central_email: Option<&str>,
) -> bool {
    let Some(central) = central_email else {
        // Without a central user the sent/received framing is undefined;
        // the filter matches nothing.
        return false;
    };
    match message_type {
        MessageType::Sent => message.sender == central,
        MessageType::Received => message
            .to
            .iter()
            .chain(&message.cc)
            .chain(&message.bcc)
            .any(|addr| addr == central),
    }
}

/// Substring/fuzzy match of a contact needle against the message's
/// sender (and, when `include_sender`, recipients too; otherwise
/// recipients only).
fn matches_participant(
    store: &GraphStore,
    message: &MessageNode,
    needle: &str,
    include_sender: bool,
) -> bool {
    let mut addresses: Vec<&str> = Vec::new();
    if include_sender && !message.sender.is_empty() {
        addresses.push(&message.sender);
    }
    addresses.extend(
        message
            .to
            .iter()
            .chain(&message.cc)
            .chain(&message.bcc)
            .map(String::as_str),
    );

    addresses.into_iter().any(|addr| {
        match store.find_user_by_email(addr).and_then(|id| store.user(id)) {
            Some(user) => user_match_score(needle, user) > 0.0,
            None => addr.contains(&needle.to_lowercase()),
        }
    })
}
