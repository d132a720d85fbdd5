//! Presence and message relay core
//!
//! - `connection`: live connection handle (outbound queue + close signal)
//! - `registry`: user id -> set of live connections
//! - `presence`: registry lifecycle and roster broadcasts
//! - `router`: message/notification fan-out and inbound dispatch
//!
//! Nothing here touches sockets. The transport hands over `Connection`
//! handles and drains their queues.

pub mod connection;
pub mod presence;
pub mod registry;
pub mod router;

pub use connection::{Connection, Frame};
pub use presence::PresenceManager;
pub use registry::ConnectionRegistry;
pub use router::EventRouter;
