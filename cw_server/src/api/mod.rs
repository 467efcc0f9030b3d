//! HTTP/WebSocket API for the Casino War server.
//!
//! The whole surface is small: one WebSocket endpoint that every client
//! (dealer console, display board, seat views) connects to, plus a health
//! probe. All game traffic flows over the socket as JSON messages with an
//! `action` discriminator.
//!
//! - `GET /ws` - upgrade to the game WebSocket
//! - `GET /health` - server health status

pub mod websocket;

use std::sync::{Arc, atomic::AtomicU64};

use axum::{Router, response::Json, routing::get};
use casino_war::TableHandle;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;

/// Application state shared across handlers and WebSocket connections.
///
/// Cloned per request (cheap, everything is a handle or an Arc).
#[derive(Clone)]
pub struct AppState {
    /// Handle to the single authoritative table actor.
    pub table: TableHandle,

    /// Monotonic id source for connected clients.
    pub next_client_id: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(table: TableHandle) -> Self {
        Self {
            table,
            next_client_id: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Create the router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Server health status.
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
