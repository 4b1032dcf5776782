//! Structured search queries.
//!
//! Queries arrive pre-parsed from an upstream NLP layer; this module
//! only models them and decides which retrieval mode serves them.

use serde::{Deserialize, Serialize};

/// Retrieval mode, declared upstream and possibly upgraded by
/// [`SearchQuery::effective_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    #[default]
    Content,
    Temporal,
    User,
    Combined,
}

/// Whether a contact filter targets mail the central user sent or received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Sent,
    Received,
}

/// Attribute and retrieval filters. All optional; empty means "no filter".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    pub contact_email: Option<String>,
    pub contact_name: Option<String>,
    pub recipient_email: Option<String>,
    pub recipient_name: Option<String>,
    /// Inclusive range start, `YYYY-MM-DD`.
    pub date_from: Option<String>,
    /// Inclusive range end, `YYYY-MM-DD`. Defaults to today when absent.
    pub date_to: Option<String>,
    pub topic_ids: Vec<String>,
    pub has_attachments: Option<bool>,
    pub is_unread: Option<bool>,
    pub is_important: Option<bool>,
    pub is_archived: Option<bool>,
    pub message_type: Option<MessageType>,
    /// Whitelist of attachment file types (lowercased extensions).
    pub attachment_types: Vec<String>,
}

impl SearchFilters {
    /// True when a contact-oriented filter is populated.
    pub fn has_contact(&self) -> bool {
        self.contact_email.is_some()
            || self.contact_name.is_some()
            || self.recipient_email.is_some()
            || self.recipient_name.is_some()
    }

    /// True when a date range is populated.
    pub fn has_date_range(&self) -> bool {
        self.date_from.is_some()
    }

    /// True when no filter at all is set.
    pub fn is_empty(&self) -> bool {
        !self.has_contact()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.topic_ids.is_empty()
            && self.has_attachments.is_none()
            && self.is_unread.is_none()
            && self.is_important.is_none()
            && self.is_archived.is_none()
            && self.message_type.is_none()
            && self.attachment_types.is_empty()
    }
}

/// A structured query, as produced by the upstream parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub query_type: QueryType,
    /// Free search text.
    #[serde(alias = "semantic_text")]
    pub text: String,
    pub filters: SearchFilters,
    /// Maximum results; 0 means "use the configured default".
    pub limit: usize,
}

impl SearchQuery {
    /// Number of active retrieval signals (text, contact, date, topics).
    pub fn signal_count(&self) -> usize {
        [
            !self.text.trim().is_empty(),
            self.filters.has_contact(),
            self.filters.has_date_range(),
            !self.filters.topic_ids.is_empty(),
        ]
        .iter()
        .filter(|&&on| on)
        .count()
    }

    /// The mode that actually serves this query.
    ///
    /// Two or more active signals always upgrade to combined; otherwise
    /// the populated filter keys override a declared `content` type
    /// (contact ⇒ user, date range ⇒ temporal).
    pub fn effective_mode(&self) -> QueryType {
        if self.signal_count() >= 2 {
            return QueryType::Combined;
        }
        match self.query_type {
            QueryType::Content => {
                if self.filters.has_contact() {
                    QueryType::User
                } else if self.filters.has_date_range() {
                    QueryType::Temporal
                } else {
                    QueryType::Content
                }
            }
            declared => declared,
        }
    }

    /// True when there is nothing to search on at all.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.filters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query() {
        let q = SearchQuery::default();
        assert!(q.is_empty());
        assert_eq!(q.signal_count(), 0);
    }

    #[test]
    fn test_flag_only_query_is_not_empty() {
        let q = SearchQuery {
            filters: SearchFilters {
                has_attachments: Some(false),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(!q.is_empty());
        // Boolean flags are not retrieval signals.
        assert_eq!(q.signal_count(), 0);
        assert_eq!(q.effective_mode(), QueryType::Content);
    }

    #[test]
    fn test_contact_upgrades_to_user_mode() {
        let q = SearchQuery {
            filters: SearchFilters {
                contact_name: Some("Alice".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(q.effective_mode(), QueryType::User);
    }

    #[test]
    fn test_date_upgrades_to_temporal_mode() {
        let q = SearchQuery {
            filters: SearchFilters {
                date_from: Some("2024-01-01".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(q.effective_mode(), QueryType::Temporal);
    }

    #[test]
    fn test_two_signals_upgrade_to_combined() {
        let q = SearchQuery {
            text: "budget".to_string(),
            filters: SearchFilters {
                contact_name: Some("Alice".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(q.signal_count(), 2);
        assert_eq!(q.effective_mode(), QueryType::Combined);
    }

    #[test]
    fn test_declared_type_honored_for_single_signal() {
        let q = SearchQuery {
            query_type: QueryType::Combined,
            text: "budget".to_string(),
            ..Default::default()
        };
        assert_eq!(q.effective_mode(), QueryType::Combined);
    }

    #[test]
    fn test_deserializes_upstream_shape() {
        let json = r#"{
            "query_type": "combined",
            "semantic_text": "quarterly numbers",
            "filters": {"contact_name": "Alice", "topic_ids": ["billing"]},
            "limit": 5
        }"#;
        let q: SearchQuery = serde_json::from_str(json).unwrap();
        assert_eq!(q.query_type, QueryType::Combined);
        assert_eq!(q.text, "quarterly numbers");
        assert_eq!(q.filters.topic_ids, vec!["billing"]);
        assert_eq!(q.limit, 5);
    }
}
