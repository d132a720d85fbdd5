//! Presence manager
//!
//! Owns the connection registry and keeps every client's view of the online
//! roster current. Each roster change produces exactly one `getOnlineUsers`
//! broadcast to all registered connections, carrying the post-change roster.
//!
//! The roster snapshot and the fan-out both happen while holding the registry
//! lock. Sends are non-blocking queue pushes, so the critical section stays
//! short, and two concurrent changes can never reach a client out of order.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::connection::Connection;
use super::registry::ConnectionRegistry;
use crate::types::{OutboundEvent, UserId};

/// Tracks live connections and publishes the online roster
#[derive(Debug, Default)]
pub struct PresenceManager {
    registry: Mutex<ConnectionRegistry>,
    roster_version: AtomicU64,
    shutting_down: AtomicBool,
}

impl PresenceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Connecting -> Online`: register an accepted connection.
    ///
    /// Broadcasts the roster to everyone when the user just came online.
    /// A second device of an already-online user leaves the roster unchanged,
    /// so only that connection is sent the current roster.
    ///
    /// After `shutdown` the connection is closed instead of registered.
    pub fn connect(&self, connection: Arc<Connection>) {
        let mut registry = self.registry.lock();
        if self.shutting_down.load(Ordering::SeqCst) {
            debug!(conn_id = %connection.id(), "rejecting connection during shutdown");
            connection.close();
            return;
        }
        let changed = registry.register(Arc::clone(&connection));
        info!(
            user_id = %connection.user_id(),
            conn_id = %connection.id(),
            online_users = registry.user_count(),
            "connection online"
        );

        if changed {
            self.publish_roster(&mut registry);
            return;
        }

        let roster = OutboundEvent::GetOnlineUsers(registry.online_user_ids().into_iter().collect());
        let delivered = roster
            .encode()
            .and_then(|frame| connection.send(frame));
        if let Err(e) = delivered {
            warn!(conn_id = %connection.id(), error = %e, "failed to send roster to new connection");
            if self.drop_connections(&mut registry, vec![connection]) {
                self.publish_roster(&mut registry);
            }
        }
    }

    /// `Online -> Closed`: close and deregister a connection.
    ///
    /// Safe to call more than once and for connections that never registered.
    pub fn disconnect(&self, connection: &Connection) {
        connection.close();
        let mut registry = self.registry.lock();
        if !registry.contains(connection.user_id(), connection.id()) {
            return;
        }
        let changed = registry.deregister(connection.user_id(), connection.id());
        info!(
            user_id = %connection.user_id(),
            conn_id = %connection.id(),
            online_users = registry.user_count(),
            "connection closed"
        );
        if changed {
            self.publish_roster(&mut registry);
        }
    }

    /// Close every connection and empty the registry (process shutdown).
    /// Later `connect` calls are refused.
    pub fn shutdown(&self) {
        let drained = {
            let mut registry = self.registry.lock();
            self.shutting_down.store(true, Ordering::SeqCst);
            registry.drain()
        };
        info!(connections = drained.len(), "closing all connections");
        for connection in drained {
            connection.close();
        }
    }

    /// Snapshot of a user's live connections
    pub fn connections_for(&self, user_id: &UserId) -> Vec<Arc<Connection>> {
        self.registry.lock().connections_for(user_id)
    }

    /// Current online roster
    pub fn online_user_ids(&self) -> BTreeSet<UserId> {
        self.registry.lock().online_user_ids()
    }

    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.registry.lock().is_online(user_id)
    }

    pub fn connection_count(&self) -> usize {
        self.registry.lock().connection_count()
    }

    /// Number of roster broadcasts published so far
    pub fn roster_version(&self) -> u64 {
        self.roster_version.load(Ordering::SeqCst)
    }

    /// Broadcast the roster to every registered connection.
    ///
    /// Connections that fail to accept the frame are dropped; if that changes
    /// the roster again, the new roster goes out as its own broadcast.
    fn publish_roster(&self, registry: &mut ConnectionRegistry) {
        loop {
            let roster: Vec<UserId> = registry.online_user_ids().into_iter().collect();
            let event = OutboundEvent::GetOnlineUsers(roster);
            let frame = match event.encode() {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(error = %e, "failed to encode roster");
                    return;
                }
            };
            let version = self.roster_version.fetch_add(1, Ordering::SeqCst) + 1;

            let recipients = registry.all_connections();
            let mut failed = Vec::new();
            for connection in &recipients {
                if let Err(e) = connection.send(Arc::clone(&frame)) {
                    warn!(conn_id = %connection.id(), user_id = %connection.user_id(), error = %e, "roster delivery failed");
                    failed.push(Arc::clone(connection));
                }
            }
            debug!(
                version,
                recipients = recipients.len(),
                failed = failed.len(),
                "roster broadcast"
            );

            if !self.drop_connections(registry, failed) {
                return;
            }
        }
    }

    /// Close and deregister failed connections. Returns whether the roster
    /// changed as a result.
    fn drop_connections(&self, registry: &mut ConnectionRegistry, failed: Vec<Arc<Connection>>) -> bool {
        let mut changed = false;
        for connection in failed {
            connection.close();
            changed |= registry.deregister(connection.user_id(), connection.id());
        }
        changed
    }
}
