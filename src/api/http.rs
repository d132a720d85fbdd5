//! HTTP server setup with Axum

use std::future::Future;
use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use super::rest::{presence, relay};
use super::websocket::{handler::ws_handler, state::AppState};
use crate::error::RelayResult;

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        // WebSocket endpoint
        .route("/ws", get(ws_handler))
        // Health check
        .route("/health", get(health_check))
        // Persistence layer hand-off
        .route("/api/relay/message", post(relay::relay_message))
        .route("/api/relay/notification", post(relay::relay_notification))
        // Presence views
        .route("/api/presence", get(presence::get_roster))
        .route("/api/presence/:user_id", get(presence::get_user_presence))
        .layer(cors)
        .with_state(state)
}

/// Serve the relay on `listener` until `shutdown` resolves.
///
/// On shutdown every live connection is closed so upgraded sockets do not
/// hold the server open.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> RelayResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let presence = Arc::clone(&state.presence);
    let app = create_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("shutting down");
            presence.shutdown();
        })
        .await?;
    Ok(())
}

/// CORS restricted to the configured frontend origins, with credentials
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
