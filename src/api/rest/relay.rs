//! Relay endpoints called by the persistence layer

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiError, ApiResponse};
use crate::api::websocket::state::AppState;
use crate::error::RelayError;
use crate::types::UserId;

/// Body of `POST /api/relay/message`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayMessageRequest {
    pub sender_id: String,
    pub receiver_id: String,
    /// The stored message, forwarded untouched
    pub message: Value,
}

/// Body of `POST /api/relay/notification`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayNotificationRequest {
    pub target_user_id: String,
    pub notification: Value,
}

/// Outcome of a relay call
#[derive(Debug, Serialize)]
pub struct Delivery {
    /// Number of live connections the payload was queued on
    pub delivered: usize,
}

/// POST /api/relay/message - Push a stored message to the receiver's devices
pub async fn relay_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RelayMessageRequest>,
) -> Response {
    let (sender, receiver) = match (UserId::parse(&req.sender_id), UserId::parse(&req.receiver_id)) {
        (Ok(sender), Ok(receiver)) => (sender, receiver),
        (Err(e), _) | (_, Err(e)) => return reject(e),
    };
    let delivered = state.router.relay_message(&sender, &receiver, req.message);
    respond(&state, delivered)
}

/// POST /api/relay/notification - Push a notification to the target's devices
pub async fn relay_notification(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RelayNotificationRequest>,
) -> Response {
    match UserId::parse(&req.target_user_id) {
        Ok(target) => {
            let delivered = state.router.relay_notification(&target, req.notification);
            respond(&state, delivered)
        }
        Err(e) => reject(e),
    }
}

fn respond(state: &AppState, delivered: usize) -> Response {
    let body = ApiResponse::new(Delivery { delivered }, state.roster_version());
    (StatusCode::OK, Json(body)).into_response()
}

fn reject(error: RelayError) -> Response {
    (StatusCode::BAD_REQUEST, Json(ApiError::bad_request(error.to_string()))).into_response()
}
