//! Data types for the relay
//!
//! Identifiers and the wire events shared by the relay core and the transport.

mod event;
mod ids;

pub use event::{InboundEvent, OutboundEvent, SendMessage};
pub use ids::{ConnectionId, UserId};
