//! HTTP/WebSocket API for the blackjack server.
//!
//! # Architecture
//!
//! - **Axum**: Async web framework for HTTP/WebSocket
//! - **Tower**: CORS middleware
//! - **Actor Model**: Session state managed by dedicated actor tasks
//!
//! # Modules
//!
//! - [`players`]: Player identity registration and lookup
//! - [`games`]: Game session management (create, join, start, hit, stand)
//! - [`websocket`]: Push channel for server-to-client notifications
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                  - Health check
//! POST /api/players             - Register player identity (idempotent)
//! GET  /api/players             - List registered players
//! GET  /api/players/{id}        - Get one player
//! GET  /api/games               - List game records
//! POST /api/games               - Create a session (body: hostPlayerID)
//! GET  /api/games/{id}          - Session snapshot
//! POST /api/games/{id}/join     - Join a forming session
//! POST /api/games/{id}/start    - Deal and begin play (host only)
//! POST /api/games/{id}/hit      - Draw a card on your turn
//! POST /api/games/{id}/stand    - Lock your score, pass the turn
//! GET  /ws                      - WebSocket push channel
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod games;
pub mod players;
pub mod websocket;

use axum::{
    Router,
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use blackjack::db::{GameRepository, PlayerRepository};
use blackjack::registry::ConnectionRegistry;
use blackjack::session::SessionManager;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket
/// connections. Cloned per request; all fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SessionManager>,
    pub registry: Arc<ConnectionRegistry>,
    pub players: Arc<dyn PlayerRepository>,
    pub games: Arc<dyn GameRepository>,
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/players", post(players::create_player).get(players::list_players))
        .route("/players/{player_id}", get(players::get_player))
        .route("/games", post(games::create_game).get(games::list_games))
        .route("/games/{game_id}", get(games::get_game))
        .route("/games/{game_id}/join", post(games::join_game))
        .route("/games/{game_id}/start", post(games::start_game))
        .route("/games/{game_id}/hit", post(games::hit))
        .route("/games/{game_id}/stand", post(games::stand));

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .nest("/api", api_routes)
        .layer(axum::middleware::from_fn(track_requests))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Count every HTTP request by method, matched route, and response status.
/// The matched route template keeps the label cardinality bounded.
async fn track_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path().to_string(), |p| p.as_str().to_string());

    let response = next.run(request).await;
    crate::metrics::http_requests_total(&method, &path, response.status().as_u16());
    response
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:3000/health
/// # {"status":"healthy","sessions":3,"connections":5,"timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let sessions = state.manager.active_session_count().await;
    crate::metrics::active_sessions(sessions);

    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": sessions,
        "connections": state.registry.len().await,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
