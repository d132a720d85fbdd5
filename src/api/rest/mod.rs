//! REST API module for HTTP endpoints
//!
//! Entry points for the persistence layer, which calls them after a record is
//! stored, plus read-only presence views:
//! - `POST /api/relay/message` - Live delivery of a stored chat message
//! - `POST /api/relay/notification` - Live delivery of a notification
//! - `GET /api/presence` - Online roster
//! - `GET /api/presence/:user_id` - One user's live connections

pub mod presence;
pub mod relay;

use serde::Serialize;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Roster version at the time of the response
    pub roster_version: u64,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, roster_version: u64) -> Self {
        Self {
            data,
            roster_version,
        }
    }
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "BAD_REQUEST".to_string(),
        }
    }
}
