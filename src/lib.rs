pub mod drawing;
pub mod error;
pub mod room;
pub mod websocket;

use axum::{routing::get, Router};
use tower_http::services::ServeDir;

use room::RoomRegistry;

/// Application state shared across all connections
#[derive(Clone)]
pub struct AppState {
    pub registry: RoomRegistry,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            registry: RoomRegistry::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the application router: the relay WebSocket endpoint plus the
/// static web client
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(websocket::handler::ws_handler))
        .nest_service("/", ServeDir::new("static"))
        .with_state(state)
}
