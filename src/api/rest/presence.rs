//! Presence endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ApiError, ApiResponse};
use crate::api::websocket::state::AppState;
use crate::types::{ConnectionId, UserId};

/// Online roster with totals
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterView {
    pub online_users: Vec<UserId>,
    pub connection_count: usize,
}

/// One live connection of a user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionView {
    pub id: ConnectionId,
    pub connected_at: DateTime<Utc>,
}

/// Presence of a single user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPresence {
    pub user_id: UserId,
    pub online: bool,
    pub connections: Vec<ConnectionView>,
}

/// GET /api/presence - Current online roster
pub async fn get_roster(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let view = RosterView {
        online_users: state.presence.online_user_ids().into_iter().collect(),
        connection_count: state.presence.connection_count(),
    };
    Json(ApiResponse::new(view, state.roster_version()))
}

/// GET /api/presence/:user_id - Live connections of one user
pub async fn get_user_presence(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Response {
    let user_id = match UserId::parse(&user_id) {
        Ok(id) => id,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(ApiError::bad_request(e.to_string()))).into_response()
        }
    };

    let mut connections: Vec<ConnectionView> = state
        .presence
        .connections_for(&user_id)
        .iter()
        .map(|c| ConnectionView {
            id: c.id().clone(),
            connected_at: c.connected_at(),
        })
        .collect();
    connections.sort_by(|a, b| a.connected_at.cmp(&b.connected_at));

    let view = UserPresence {
        online: !connections.is_empty(),
        user_id,
        connections,
    };
    (StatusCode::OK, Json(ApiResponse::new(view, state.roster_version()))).into_response()
}
