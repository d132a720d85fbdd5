//! API module for HTTP and WebSocket endpoints
//!
//! This module exposes the relay over WebSocket for clients and over HTTP for
//! the persistence layer.

pub mod http;
pub mod rest;
pub mod websocket;

pub use http::create_router;
pub use websocket::AppState;
