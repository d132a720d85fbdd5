//! Live connection handle
//!
//! The transport owns the socket; the relay only ever sees this handle. Sends
//! never block: frames go into a bounded per-connection queue that the
//! transport drains in order, which gives per-connection FIFO delivery.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::config::MAX_OUTBOUND_BUFFER;
use crate::error::{RelayError, RelayResult};
use crate::types::{ConnectionId, UserId};

/// Pre-encoded JSON frame shared across a fan-out
pub type Frame = Arc<String>;

/// One live duplex channel, bound to a single user for its whole life
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    user_id: UserId,
    connected_at: DateTime<Utc>,
    tx: mpsc::Sender<Frame>,
    closed: CancellationToken,
}

impl Connection {
    /// Open a connection for `user_id` with an outbound queue of `capacity`
    /// frames, clamped to `1..=MAX_OUTBOUND_BUFFER`. The receiver is handed
    /// to the transport's writer.
    pub fn open(user_id: UserId, capacity: usize) -> (Arc<Self>, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity.clamp(1, MAX_OUTBOUND_BUFFER));
        let conn = Self {
            id: ConnectionId::generate(),
            user_id,
            connected_at: Utc::now(),
            tx,
            closed: CancellationToken::new(),
        };
        (Arc::new(conn), rx)
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Queue a frame for delivery
    pub fn send(&self, frame: Frame) -> RelayResult<()> {
        if self.closed.is_cancelled() {
            return Err(RelayError::ConnectionClosed(self.id.clone()));
        }
        self.tx.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => RelayError::QueueFull(self.id.clone()),
            TrySendError::Closed(_) => RelayError::ConnectionClosed(self.id.clone()),
        })
    }

    /// Ask the transport to close the socket. Idempotent.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled() || self.tx.is_closed()
    }

    /// Resolves once `close` has been called
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.closed.cancelled()
    }
}
