//! Wire events exchanged with connected clients
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`. Event
//! names are camelCase so existing socket clients keep working unchanged.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::UserId;
use crate::error::RelayResult;

/// Events the relay pushes to clients
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum OutboundEvent {
    /// Full online roster, sent on every membership change
    GetOnlineUsers(Vec<UserId>),

    /// A chat message addressed to the receiving user
    ReceiveMessage(Value),

    /// A social-interaction notification (likes and similar)
    Notification(Value),

    /// Reply to a client `ping`
    Pong,
}

impl OutboundEvent {
    /// Event name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetOnlineUsers(_) => "getOnlineUsers",
            Self::ReceiveMessage(_) => "receiveMessage",
            Self::Notification(_) => "notification",
            Self::Pong => "pong",
        }
    }

    /// Serialize once so a fan-out can share the frame across connections
    pub fn encode(&self) -> RelayResult<Arc<String>> {
        Ok(Arc::new(serde_json::to_string(self)?))
    }
}

/// Events clients send to the relay
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum InboundEvent {
    /// Relay an already-persisted chat message to another user
    SendMessage(SendMessage),

    /// Application-level heartbeat
    Ping,
}

/// Body of a `sendMessage` event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub receiver_id: UserId,
    pub message: Value,
}
