//! WebSocket transport for the relay
//!
//! Provides the `/ws?userId=...` endpoint. Each socket becomes one relay
//! `Connection`; frames are JSON `{"event", "data"}` objects.

pub mod handler;
pub mod state;

pub use handler::ws_handler;
pub use state::AppState;
