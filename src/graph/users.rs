//! User node manager.
//!
//! Owns the central-user state and the surrogate-id counter. User nodes
//! are created lazily on first reference (as sender or any recipient)
//! and never deleted within a build.

use tracing::debug;

use crate::error::{EngineError, Result};
use crate::model::address::{extract_email_parts, normalize_email};
use crate::model::node::{Node, UserNode};

use super::store::GraphStore;

/// Creates and looks up user nodes, keyed by normalized email.
#[derive(Debug, Default)]
pub struct UserManager {
    central_email: Option<String>,
    next_id: u64,
}

impl UserManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the mailbox owner. Must be called before message processing.
    ///
    /// The address is normalized and stored for all subsequent
    /// `is_central_user` comparisons. Changing it mid-build does not
    /// re-flag already-created user nodes — that is the caller's
    /// responsibility to avoid.
    pub fn set_central_user(&mut self, raw_email: &str) -> Result<()> {
        let normalized = normalize_email(raw_email);
        if normalized.is_empty() {
            return Err(EngineError::InvalidCentralUser(raw_email.to_string()));
        }
        self.central_email = Some(normalized);
        Ok(())
    }

    /// Normalized central-user email, if set.
    pub fn central_email(&self) -> Option<&str> {
        self.central_email.as_deref()
    }

    /// Find or create the user node for a raw address, returning its
    /// surrogate id. Returns `None` for input that does not normalize
    /// to a valid address.
    pub fn get_or_create(&mut self, store: &mut GraphStore, raw_address: &str) -> Option<String> {
        let parts = extract_email_parts(raw_address)?;

        if let Some(existing) = store.find_user_by_email(&parts.address) {
            return Some(existing.to_string());
        }

        self.next_id += 1;
        let id = format!("user-{}", self.next_id);
        let is_central = self.central_email.as_deref() == Some(parts.address.as_str());
        debug!(user_id = %id, email = %parts.address, is_central, "Creating user node");

        store.insert_node(Node::User(UserNode {
            id: id.clone(),
            email: parts.address,
            display_name: parts.display_name,
            domain: parts.domain,
            is_central_user: is_central,
            connection_strength: 0.0,
        }));
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_is_keyed_by_email() {
        let mut store = GraphStore::new();
        let mut users = UserManager::new();

        let a = users.get_or_create(&mut store, "Alice <alice@x.com>").unwrap();
        let b = users.get_or_create(&mut store, "ALICE@X.COM").unwrap();
        assert_eq!(a, b);
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn test_invalid_address_returns_none() {
        let mut store = GraphStore::new();
        let mut users = UserManager::new();
        assert!(users.get_or_create(&mut store, "").is_none());
        assert!(users.get_or_create(&mut store, "no-at-sign").is_none());
    }

    #[test]
    fn test_central_user_flagged_at_creation() {
        let mut store = GraphStore::new();
        let mut users = UserManager::new();
        users.set_central_user("Me <me@x.com>").unwrap();

        let me = users.get_or_create(&mut store, "me@x.com").unwrap();
        let other = users.get_or_create(&mut store, "other@x.com").unwrap();

        assert!(store.user(&me).unwrap().is_central_user);
        assert!(!store.user(&other).unwrap().is_central_user);
    }

    #[test]
    fn test_central_flag_frozen_after_creation() {
        let mut store = GraphStore::new();
        let mut users = UserManager::new();

        let id = users.get_or_create(&mut store, "me@x.com").unwrap();
        users.set_central_user("me@x.com").unwrap();

        // Created before set_central_user — stays unflagged.
        assert!(!store.user(&id).unwrap().is_central_user);
    }

    #[test]
    fn test_set_central_user_rejects_invalid() {
        let mut users = UserManager::new();
        assert!(matches!(
            users.set_central_user("not an email"),
            Err(EngineError::InvalidCentralUser(_))
        ));
        assert!(users.central_email().is_none());
    }

    #[test]
    fn test_user_attributes() {
        let mut store = GraphStore::new();
        let mut users = UserManager::new();
        let id = users
            .get_or_create(&mut store, "john.doe@corp.example.com")
            .unwrap();
        let node = store.user(&id).unwrap();
        assert_eq!(node.email, "john.doe@corp.example.com");
        assert_eq!(node.domain, "corp.example.com");
        assert_eq!(node.display_name, "John Doe");
        assert_eq!(node.connection_strength, 0.0);
    }
}
