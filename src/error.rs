//! Centralized error types for mailgraph.

use thiserror::Error;

/// All errors produced by the mailgraph library.
///
/// Per-record ingestion failures are caught and aggregated by the graph
/// builder; the only variants a caller of the public API will observe are
/// [`EngineError::InvalidCentralUser`] and [`EngineError::EmptyQuery`].
#[derive(Error, Debug)]
pub enum EngineError {
    /// The central-user email did not normalize to a valid address.
    #[error("Invalid central user email: '{0}'")]
    InvalidCentralUser(String),

    /// A search was submitted with no query text and no filters.
    #[error("Empty query: no search text and no filters provided")]
    EmptyQuery,

    /// A record could not be ingested (missing message id, or a node
    /// operation failed). Caught by the graph builder and counted.
    #[error("Record error{}: {reason}", record_suffix(.message_id))]
    Record {
        message_id: Option<String>,
        reason: String,
    },

    /// A graph snapshot could not be restored (dangling edge endpoint,
    /// duplicate node id).
    #[error("Corrupt snapshot: {0}")]
    InvalidSnapshot(String),

    /// Serialization failure (snapshot encode/decode).
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

fn record_suffix(id: &Option<String>) -> String {
    match id {
        Some(id) => format!(" ({id})"),
        None => String::new(),
    }
}

/// Convenience alias for `Result<T, EngineError>`.
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Create a `Record` variant for a failure tied to a specific message.
    pub fn record(message_id: impl Into<Option<String>>, reason: impl Into<String>) -> Self {
        Self::Record {
            message_id: message_id.into(),
            reason: reason.into(),
        }
    }
}
