//! Feed Relay Server
//!
//! Real-time presence and message relay for a social feed. Tracks which users
//! are connected, keeps every client's online roster current, and forwards
//! already-persisted chat messages and notifications to live connections.
//!
//! # Features
//!
//! - **Multi-device presence**: any number of connections per user
//! - **Full roster broadcast**: every membership change reaches every client
//! - **Best-effort fan-out**: offline receivers are skipped, failed sends are isolated
//! - **Thread-Safe**: registry serialized behind a single mutex
//!
//! # Modules
//!
//! - `types`: Identifiers and wire events
//! - `relay`: Connection registry, presence manager and event router
//! - `api`: WebSocket transport and HTTP endpoints
//! - `config`: Environment configuration
//! - `error`: Error types
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use feed_relay::{api, AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> feed_relay::RelayResult<()> {
//!     let config = Config::from_env()?;
//!     let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
//!     let state = Arc::new(AppState::new(config));
//!     api::http::serve(listener, state, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod relay;
pub mod types;

// Re-export commonly used items at crate root
pub use api::AppState;
pub use config::Config;
pub use error::{RelayError, RelayResult};
pub use relay::{Connection, ConnectionRegistry, EventRouter, PresenceManager};
pub use types::{ConnectionId, InboundEvent, OutboundEvent, UserId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
