//! Player identity API handlers.
//!
//! Players are self-declared string identities with no credentials. The
//! create endpoint is idempotent: registering an existing identity answers
//! with the stored record unchanged.
//!
//! # Examples
//!
//! Register a player:
//! ```bash
//! curl -X POST http://localhost:3000/api/players \
//!   -H "Content-Type: application/json" \
//!   -d '{"playerID": "alice"}'
//! ```

use axum::{Json, extract::Path, extract::State, http::StatusCode};
use serde::Deserialize;

use blackjack::PlayerId;
use blackjack::db::PlayerRecord;

use super::AppState;
use super::games::ErrorResponse;

#[derive(Debug, Deserialize)]
pub struct CreatePlayerRequest {
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
}

/// Register a player identity.
///
/// # Response
///
/// Returns `200 OK` with the stored record, whether it was just created or
/// already existed:
/// ```json
/// {"playerID": "alice", "score": 0, "createdAt": "2026-08-27T10:30:00Z"}
/// ```
///
/// # Errors
///
/// - `500 Internal Server Error`: Store failure
pub async fn create_player(
    State(state): State<AppState>,
    Json(request): Json<CreatePlayerRequest>,
) -> Result<Json<PlayerRecord>, (StatusCode, Json<ErrorResponse>)> {
    match state.players.put_player(&request.player_id).await {
        Ok(record) => Ok(Json(record)),
        Err(e) => {
            log::error!("failed to register player {}: {e}", request.player_id);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "failed to register player".to_string(),
                }),
            ))
        }
    }
}

/// Get one registered player.
///
/// # Errors
///
/// - `404 Not Found`: No such player
/// - `500 Internal Server Error`: Store failure
pub async fn get_player(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<PlayerRecord>, (StatusCode, Json<ErrorResponse>)> {
    let id = PlayerId::from(player_id);
    match state.players.get_player(&id).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("player {id} not found"),
            }),
        )),
        Err(e) => {
            log::error!("failed to look up player {id}: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "failed to look up player".to_string(),
                }),
            ))
        }
    }
}

/// List all registered players, oldest first.
pub async fn list_players(
    State(state): State<AppState>,
) -> Result<Json<Vec<PlayerRecord>>, (StatusCode, Json<ErrorResponse>)> {
    match state.players.list_players().await {
        Ok(records) => Ok(Json(records)),
        Err(e) => {
            log::error!("failed to list players: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "failed to list players".to_string(),
                }),
            ))
        }
    }
}
