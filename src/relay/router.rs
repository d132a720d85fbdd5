//! Event router: fan-out of chat messages and notifications

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::connection::Connection;
use super::presence::PresenceManager;
use crate::types::{InboundEvent, OutboundEvent, UserId};

/// Routes payloads to the live connections of their target user.
///
/// Delivery is best-effort and at-most-once: offline targets are skipped
/// silently, and a failed send only affects the connection it failed on.
#[derive(Debug, Clone)]
pub struct EventRouter {
    presence: Arc<PresenceManager>,
}

impl EventRouter {
    pub fn new(presence: Arc<PresenceManager>) -> Self {
        Self { presence }
    }

    /// Deliver `receiveMessage(payload)` to every connection of `receiver_id`.
    ///
    /// Returns how many connections the frame was queued on.
    pub fn relay_message(&self, sender_id: &UserId, receiver_id: &UserId, payload: Value) -> usize {
        let delivered = self.fan_out(receiver_id, &OutboundEvent::ReceiveMessage(payload));
        debug!(sender_id = %sender_id, receiver_id = %receiver_id, delivered, "relayed message");
        delivered
    }

    /// Deliver `notification(payload)` to every connection of `target_user_id`
    pub fn relay_notification(&self, target_user_id: &UserId, payload: Value) -> usize {
        let delivered = self.fan_out(target_user_id, &OutboundEvent::Notification(payload));
        debug!(target_user_id = %target_user_id, delivered, "relayed notification");
        delivered
    }

    /// Handle one inbound event from `origin`
    pub fn dispatch(&self, origin: &Arc<Connection>, event: InboundEvent) {
        match event {
            InboundEvent::SendMessage(msg) => {
                self.relay_message(origin.user_id(), &msg.receiver_id, msg.message);
            }
            InboundEvent::Ping => self.deliver(origin, &OutboundEvent::Pong),
        }
    }

    fn fan_out(&self, user_id: &UserId, event: &OutboundEvent) -> usize {
        let connections = self.presence.connections_for(user_id);
        if connections.is_empty() {
            return 0;
        }

        let frame = match event.encode() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(event = event.name(), error = %e, "failed to encode event");
                return 0;
            }
        };

        let mut delivered = 0;
        for connection in &connections {
            match connection.send(Arc::clone(&frame)) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        event = event.name(),
                        conn_id = %connection.id(),
                        user_id = %user_id,
                        error = %e,
                        "delivery failed, dropping connection"
                    );
                    self.presence.disconnect(connection);
                }
            }
        }
        delivered
    }

    fn deliver(&self, connection: &Arc<Connection>, event: &OutboundEvent) {
        let result = event.encode().and_then(|frame| connection.send(frame));
        if let Err(e) = result {
            warn!(event = event.name(), conn_id = %connection.id(), error = %e, "delivery failed");
            if e.is_delivery_failure() {
                self.presence.disconnect(connection);
            }
        }
    }
}
