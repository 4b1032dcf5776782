//! Graph node and edge types.
//!
//! Nodes are a tagged union stored in the petgraph arena; each variant
//! carries only typed fields (no stringly-keyed attribute maps).

use serde::{Deserialize, Serialize};

/// A node in the email graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Message(MessageNode),
    User(UserNode),
    Thread(ThreadNode),
}

impl Node {
    /// External id of this node (message id, surrogate user id, thread id).
    pub fn id(&self) -> &str {
        match self {
            Node::Message(m) => &m.id,
            Node::User(u) => &u.id,
            Node::Thread(t) => &t.id,
        }
    }

    pub fn as_message(&self) -> Option<&MessageNode> {
        match self {
            Node::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&UserNode> {
        match self {
            Node::User(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_thread(&self) -> Option<&ThreadNode> {
        match self {
            Node::Thread(t) => Some(t),
            _ => None,
        }
    }
}

/// One email message. Created once per distinct message id; attributes
/// are fixed at creation (first write wins on duplicates).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageNode {
    /// Stable provider message id.
    pub id: String,
    /// Thread id, empty when the record had none.
    pub thread_id: String,
    /// Canonical `YYYY-MM-DDTHH:MM:SS` date, empty when unparsable.
    pub date: String,
    pub subject: String,
    pub body: String,
    /// Normalized sender address (may be empty).
    pub sender: String,
    /// Normalized recipient addresses, per header. Not deduplicated.
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub has_attachments: bool,
    pub attachment_count: usize,
    /// Lowercased attachment file types (extensions), for filtering.
    pub attachment_types: Vec<String>,
    pub is_important: bool,
    pub is_unread: bool,
    pub is_archived: bool,
    pub labels: Vec<String>,
    pub categories: Vec<String>,
    /// Externally assigned topics.
    pub topics: Vec<String>,
    pub snippet: String,
}

/// A mailbox participant, keyed by normalized email via the store's
/// auxiliary lookup. The id is an opaque surrogate (`user-N`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserNode {
    /// Surrogate id, stable for the process lifetime.
    pub id: String,
    /// Normalized email — the unique lookup key.
    pub email: String,
    pub display_name: String,
    pub domain: String,
    /// Frozen at creation time; a later `set_central_user` call does not
    /// re-flag existing nodes.
    pub is_central_user: bool,
    /// Aggregate weighted interaction volume with the central user.
    /// Monotonically non-decreasing; never incremented on the central
    /// user's own node.
    pub connection_strength: f64,
}

/// A provider conversation grouping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadNode {
    /// Provider thread id.
    pub id: String,
    /// Set once from the first message seen; immutable afterwards.
    pub first_message_id: String,
    /// Subject of the first message only.
    pub subject: String,
    /// Number of distinct messages linked to this thread.
    pub message_count: usize,
    /// Lexicographic max of contributing dates (empty sorts as oldest).
    pub last_message_date: String,
    /// Union of sender + recipients across all messages (set semantics,
    /// insertion order).
    pub participants: Vec<String>,
    /// Union of contributing messages' topics (set semantics).
    pub topics: Vec<String>,
}

/// Typed, weighted edge between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    pub kind: EdgeKind,
    pub weight: f64,
}

/// Every relationship kind in the multigraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    /// user → message
    Sent,
    /// message → user (To recipient)
    Received,
    /// message → user (Cc recipient)
    Cc,
    /// message → user (Bcc recipient)
    Bcc,
    /// message → thread
    PartOfThread,
    /// message → chronologically previous message in the same thread
    RepliedTo,
    /// user → user aggregate (To)
    Emailed,
    /// user → user aggregate (Cc)
    EmailedCc,
    /// user → user aggregate (Bcc)
    EmailedBcc,
}

impl EdgeKind {
    /// Weight of the message↔user edge for a recipient kind.
    pub fn recipient_weight(self) -> f64 {
        match self {
            EdgeKind::Received => 1.0,
            EdgeKind::Cc => 0.8,
            EdgeKind::Bcc => 0.6,
            _ => 1.0,
        }
    }

    /// Weight of the user→user aggregate edge for this recipient kind,
    /// depending on whether the sender is the central user.
    pub fn contact_weight(self, sender_is_central: bool) -> f64 {
        match (self, sender_is_central) {
            (EdgeKind::Emailed, true) => 3.0,
            (EdgeKind::Emailed, false) => 1.0,
            (EdgeKind::EmailedCc, true) => 1.5,
            (EdgeKind::EmailedCc, false) => 0.5,
            (EdgeKind::EmailedBcc, true) => 1.0,
            (EdgeKind::EmailedBcc, false) => 0.3,
            _ => 1.0,
        }
    }

    /// Weight of a SENT edge depending on whether the sender is central.
    pub fn sent_weight(sender_is_central: bool) -> f64 {
        if sender_is_central {
            3.0
        } else {
            1.0
        }
    }
}
