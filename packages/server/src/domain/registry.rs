//! Connection registry: user identity ←→ live transport connections.
//!
//! A user may hold several simultaneous connections (multiple tabs or
//! devices). Presence is derived: a user is online iff at least one live
//! connection exists. Every mutation returns the resulting
//! [`PresenceTransition`] so the caller can broadcast presence changes in
//! the same logical step, without polling.

use std::collections::{HashMap, HashSet};

use super::errors::RegistryError;
use super::value_object::{ConnectionId, UserId};

/// Presence change produced by a registry mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceTransition {
    /// First connection for this user: 0 → 1.
    CameOnline(UserId),
    /// Last connection for this user closed: N → 0.
    WentOffline(UserId),
    /// Connection count stayed ≥ 1, or a duplicate close landed: no
    /// presence broadcast. Idempotence here is what prevents presence
    /// flicker for multi-tab users.
    NoChange,
}

/// In-memory registry of live connections.
///
/// Process-lifetime state, fully rebuildable from nothing after a restart:
/// clients reconnect and re-register.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    by_connection: HashMap<ConnectionId, UserId>,
    by_user: HashMap<UserId, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new connection for the given user.
    ///
    /// Returns [`PresenceTransition::CameOnline`] when this is the user's
    /// first live connection. Connection ids are server-assigned, so a
    /// duplicate id is an invariant violation, not a recoverable condition.
    pub fn register(
        &mut self,
        connection_id: ConnectionId,
        user: UserId,
    ) -> Result<PresenceTransition, RegistryError> {
        if self.by_connection.contains_key(&connection_id) {
            return Err(RegistryError::DuplicateConnection(connection_id.to_string()));
        }

        let connections = self.by_user.entry(user.clone()).or_default();
        let first_connection = connections.is_empty();
        connections.insert(connection_id);
        self.by_connection.insert(connection_id, user.clone());

        if first_connection {
            Ok(PresenceTransition::CameOnline(user))
        } else {
            Ok(PresenceTransition::NoChange)
        }
    }

    /// Remove a connection.
    ///
    /// A no-op for unknown ids, since close events can race. Returns
    /// [`PresenceTransition::WentOffline`] only when the user's last
    /// connection disappeared.
    pub fn unregister(&mut self, connection_id: &ConnectionId) -> PresenceTransition {
        let Some(user) = self.by_connection.remove(connection_id) else {
            return PresenceTransition::NoChange;
        };

        let last_connection = match self.by_user.get_mut(&user) {
            Some(connections) => {
                connections.remove(connection_id);
                connections.is_empty()
            }
            None => true,
        };

        if last_connection {
            self.by_user.remove(&user);
            PresenceTransition::WentOffline(user)
        } else {
            PresenceTransition::NoChange
        }
    }

    /// All live connection ids for the given user (possibly empty).
    pub fn connections_for(&self, user: &UserId) -> Vec<ConnectionId> {
        self.by_user
            .get(user)
            .map(|connections| connections.iter().copied().collect())
            .unwrap_or_default()
    }

    /// True iff the user has at least one live connection.
    pub fn is_online(&self, user: &UserId) -> bool {
        self.by_user.contains_key(user)
    }

    /// The user identity owning the given connection.
    pub fn user_of(&self, connection_id: &ConnectionId) -> Option<&UserId> {
        self.by_connection.get(connection_id)
    }

    /// Snapshot of all currently online users, sorted for stable output.
    pub fn online_users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.by_user.keys().cloned().collect();
        users.sort();
        users
    }

    /// All live connection ids across all users.
    pub fn all_connections(&self) -> Vec<ConnectionId> {
        self.by_connection.keys().copied().collect()
    }

    pub fn connection_count(&self) -> usize {
        self.by_connection.len()
    }
}
