//! Error types for the relay

use thiserror::Error;

use crate::types::ConnectionId;

/// Result type for relay operations
pub type RelayResult<T> = Result<T, RelayError>;

/// Everything that can go wrong inside the relay.
///
/// Only `Config` and `Io` ever reach `main`. Delivery errors are logged at the
/// point of failure and turned into a disconnect.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The connection carried no user identifier
    #[error("missing user identifier")]
    MissingUserId,

    /// The user identifier was present but unusable
    #[error("invalid user identifier {0:?}")]
    InvalidUserId(String),

    /// Send targeted a connection that has already closed
    #[error("connection {0} is closed")]
    ConnectionClosed(ConnectionId),

    /// The connection's outbound queue is full (slow consumer)
    #[error("outbound queue full for connection {0}")]
    QueueFull(ConnectionId),

    /// An outbound event could not be serialized
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    /// A configuration value could not be parsed
    #[error("invalid value for {key}: {value:?}")]
    Config { key: &'static str, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Whether this error means the target connection should be dropped
    pub fn is_delivery_failure(&self) -> bool {
        matches!(self, Self::ConnectionClosed(_) | Self::QueueFull(_))
    }
}
