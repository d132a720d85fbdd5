//! WebSocket connection handler
//!
//! The transport side of the relay: accepts sockets, binds each one to a
//! `Connection` handle, drains its outbound queue, feeds inbound frames to the
//! router and reports disconnects to the presence manager.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::state::AppState;
use crate::relay::Connection;
use crate::types::{InboundEvent, UserId};

/// Close code sent when the handshake carries no usable user id
pub const CLOSE_INVALID_USER: u16 = 1008;

/// Close code sent when the server drops the connection (shutdown, timeout)
pub const CLOSE_GOING_AWAY: u16 = 1001;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// User identifier, already authenticated upstream
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// GET /ws?userId=... - WebSocket upgrade handler
///
/// A missing or malformed user id still upgrades, then closes immediately
/// with 1008 so browser clients see a reason. Such sockets never register.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match UserId::from_param(params.user_id.as_deref()) {
        Ok(user_id) => ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)),
        Err(e) => {
            warn!(error = %e, "rejecting connection");
            ws.on_upgrade(move |mut socket| async move {
                let frame = CloseFrame {
                    code: CLOSE_INVALID_USER,
                    reason: e.to_string().into(),
                };
                let _ = socket.send(Message::Close(Some(frame))).await;
            })
        }
    }
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: UserId) {
    let (conn, mut outbound) = Connection::open(user_id, state.config.outbound_buffer);
    let (mut sink, mut stream) = socket.split();

    state.presence.connect(Arc::clone(&conn));

    let mut heartbeat = interval(state.config.heartbeat_interval);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Skip the immediate first tick
    heartbeat.tick().await;
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            // Closed by the relay (failed delivery or shutdown)
            _ = conn.closed() => {
                let frame = CloseFrame {
                    code: CLOSE_GOING_AWAY,
                    reason: "connection closed by server".into(),
                };
                let _ = sink.send(Message::Close(Some(frame))).await;
                break;
            }

            // Frames queued by the relay
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                if sink.send(Message::Text(frame.as_str().to_owned())).await.is_err() {
                    break; // Client disconnected
                }
            }

            // Liveness
            _ = heartbeat.tick() => {
                if last_seen.elapsed() >= state.config.idle_timeout {
                    info!(conn_id = %conn.id(), user_id = %conn.user_id(), "idle timeout");
                    break;
                }
                if sink.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }

            // Client frames
            incoming = stream.next() => {
                let msg = match incoming {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        debug!(conn_id = %conn.id(), error = %e, "websocket error");
                        break;
                    }
                    None => break, // Client disconnected
                };
                last_seen = Instant::now();

                if let Message::Ping(data) = msg {
                    if sink.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                    continue;
                }
                if !handle_client_message(msg, &conn, &state) {
                    break;
                }
            }
        }
    }

    state.presence.disconnect(&conn);
}

/// Handle a message from the client
/// Returns false if the connection should be closed
fn handle_client_message(msg: Message, conn: &Arc<Connection>, state: &AppState) -> bool {
    match msg {
        Message::Text(text) => {
            match serde_json::from_str::<InboundEvent>(&text) {
                Ok(event) => state.router.dispatch(conn, event),
                Err(e) => debug!(conn_id = %conn.id(), error = %e, "ignoring malformed frame"),
            }
            true
        }
        Message::Binary(_) => true, // Ignore binary messages
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(frame) => {
            debug!(conn_id = %conn.id(), reason = ?frame, "client requested close");
            false
        }
    }
}
