//! Connection registry: user id -> live connections
//!
//! A plain data structure. It does no locking and triggers no broadcasts;
//! `PresenceManager` owns it behind a mutex and reacts to the returned
//! "roster changed" flags.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::connection::Connection;
use crate::types::{ConnectionId, UserId};

/// Maps each online user to the set of their open connections.
///
/// Invariant: a user id is a key only while its set is non-empty.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    users: HashMap<UserId, HashMap<ConnectionId, Arc<Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection under its user id.
    ///
    /// Registering the same handle twice keeps a single entry. Returns `true`
    /// when the user was not online before, i.e. the roster changed.
    pub fn register(&mut self, connection: Arc<Connection>) -> bool {
        let user_id = connection.user_id().clone();
        let newly_online = !self.users.contains_key(&user_id);
        self.users
            .entry(user_id)
            .or_default()
            .insert(connection.id().clone(), connection);
        newly_online
    }

    /// Remove one connection, pruning the user when it was the last one.
    ///
    /// Unknown handles are ignored. Returns `true` when the user went offline.
    pub fn deregister(&mut self, user_id: &UserId, connection_id: &ConnectionId) -> bool {
        let Some(connections) = self.users.get_mut(user_id) else {
            return false;
        };
        if connections.remove(connection_id).is_none() {
            return false;
        }
        if connections.is_empty() {
            self.users.remove(user_id);
            return true;
        }
        false
    }

    /// Snapshot of a user's live connections (empty when offline)
    pub fn connections_for(&self, user_id: &UserId) -> Vec<Arc<Connection>> {
        self.users
            .get(user_id)
            .map(|conns| conns.values().cloned().collect())
            .unwrap_or_default()
    }

    /// The online roster
    pub fn online_user_ids(&self) -> BTreeSet<UserId> {
        self.users.keys().cloned().collect()
    }

    /// Snapshot of every registered connection
    pub fn all_connections(&self) -> Vec<Arc<Connection>> {
        self.users
            .values()
            .flat_map(|conns| conns.values().cloned())
            .collect()
    }

    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.users.contains_key(user_id)
    }

    pub fn contains(&self, user_id: &UserId, connection_id: &ConnectionId) -> bool {
        self.users
            .get(user_id)
            .is_some_and(|conns| conns.contains_key(connection_id))
    }

    /// Number of online users
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Number of registered connections across all users
    pub fn connection_count(&self) -> usize {
        self.users.values().map(HashMap::len).sum()
    }

    /// Remove and return every connection
    pub fn drain(&mut self) -> Vec<Arc<Connection>> {
        self.users
            .drain()
            .flat_map(|(_, conns)| conns.into_values())
            .collect()
    }
}
