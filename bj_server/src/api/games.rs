//! Game session API handlers.
//!
//! Every mutation is forwarded to the owning session actor through the
//! session manager; handlers never touch game state directly. Hands live
//! only on the server, so requests identify cards by action ("hit"), never
//! by card content.
//!
//! # Examples
//!
//! Create a game:
//! ```bash
//! curl -X POST http://localhost:3000/api/games \
//!   -H "Content-Type: application/json" \
//!   -d '{"hostPlayerID": "alice"}'
//! ```
//!
//! Hit on your turn:
//! ```bash
//! curl -X POST http://localhost:3000/api/games/<id>/hit \
//!   -H "Content-Type: application/json" \
//!   -d '{"playerID": "alice", "deckID": "3p40paa87x90"}'
//! ```

use axum::{Json, extract::Path, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use blackjack::db::GameRecord;
use blackjack::game::GameError;
use blackjack::game::entities::{DeckToken, PlayerId, SessionId};
use blackjack::game::session::HitResult;
use blackjack::session::{SessionSnapshot, StandResult, StartResult};

use super::AppState;
use crate::metrics;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    #[serde(rename = "hostPlayerID")]
    pub host_player_id: PlayerId,
}

#[derive(Debug, Serialize)]
pub struct CreateGameResponse {
    #[serde(rename = "gameId")]
    pub game_id: SessionId,
}

#[derive(Debug, Deserialize)]
pub struct PlayerActionRequest {
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
}

#[derive(Debug, Deserialize)]
pub struct HitRequest {
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    #[serde(rename = "deckID")]
    pub deck_id: DeckToken,
}

#[derive(Debug, Serialize)]
pub struct JoinGameResponse {
    #[serde(rename = "hostPlayerID")]
    pub host_player_id: PlayerId,
    #[serde(rename = "gameID")]
    pub game_id: SessionId,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a coordinator error to an HTTP status and JSON body.
fn error_response(err: GameError) -> ApiError {
    let status = match &err {
        GameError::SessionNotFound => StatusCode::NOT_FOUND,
        GameError::PlayerBusy(_) => StatusCode::CONFLICT,
        GameError::UpstreamDraw(_) => StatusCode::BAD_GATEWAY,
        GameError::Store(_) | GameError::SessionClosed => StatusCode::INTERNAL_SERVER_ERROR,
        GameError::InvalidState(_)
        | GameError::OutOfTurn
        | GameError::DeckMismatch
        | GameError::NotEnoughPlayers
        | GameError::NotHost => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// Make sure the acting player has a stored identity record. Creation and
/// joining double as registration for first-time players.
async fn ensure_player(state: &AppState, player: &PlayerId) -> Result<(), ApiError> {
    state
        .players
        .put_player(player)
        .await
        .map(|_| ())
        .map_err(|e| error_response(GameError::Store(e)))
}

/// List all game records, most recently updated first.
///
/// Concluded sessions are retained for history, so this is an audit view,
/// not just the live set.
pub async fn list_games(
    State(state): State<AppState>,
) -> Result<Json<Vec<GameRecord>>, ApiError> {
    state
        .games
        .list_games()
        .await
        .map(Json)
        .map_err(|e| error_response(GameError::Store(e)))
}

/// Create a new game session hosted by the request's player.
///
/// # Response
///
/// Returns `200 OK` with the session identifier:
/// ```json
/// {"gameId": "7c9e6679-7425-40de-944b-e07fc1f90ae7"}
/// ```
///
/// # Errors
///
/// - `409 Conflict`: The host is already in a non-concluded session
pub async fn create_game(
    State(state): State<AppState>,
    Json(request): Json<CreateGameRequest>,
) -> Result<Json<CreateGameResponse>, ApiError> {
    ensure_player(&state, &request.host_player_id).await?;
    let game_id = state
        .manager
        .create_session(request.host_player_id)
        .await
        .map_err(error_response)?;
    metrics::games_created_total();
    Ok(Json(CreateGameResponse { game_id }))
}

/// Session snapshot: members, lifecycle state, turn holder, and scores.
pub async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<SessionId>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    state
        .manager
        .snapshot(game_id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Join a forming game session.
///
/// The response names the host so the client can address the lobby owner.
/// The host is notified of the join over their push channel.
///
/// # Errors
///
/// - `404 Not Found`: No such session
/// - `409 Conflict`: The player is already in a non-concluded session
/// - `400 Bad Request`: The session is no longer forming
pub async fn join_game(
    State(state): State<AppState>,
    Path(game_id): Path<SessionId>,
    Json(request): Json<PlayerActionRequest>,
) -> Result<Json<JoinGameResponse>, ApiError> {
    ensure_player(&state, &request.player_id).await?;
    let host_player_id = state
        .manager
        .join_session(game_id, request.player_id)
        .await
        .map_err(error_response)?;
    Ok(Json(JoinGameResponse {
        host_player_id,
        game_id,
    }))
}

/// Begin play: acquire a fresh deck, deal two cards to every member, and
/// hand the first turn to the host.
///
/// Only the host can start, and only with at least two members. The
/// response carries the deck token and every member's initial hand; each
/// member is additionally pushed their own hand (and only their own) over
/// their push channel.
///
/// # Errors
///
/// - `400 Bad Request`: Caller is not the host, too few members, or the
///   session is not forming
/// - `502 Bad Gateway`: The upstream deck service failed; the session is
///   left forming
pub async fn start_game(
    State(state): State<AppState>,
    Path(game_id): Path<SessionId>,
    Json(request): Json<PlayerActionRequest>,
) -> Result<Json<StartResult>, ApiError> {
    let result = state
        .manager
        .start_session(game_id, request.player_id)
        .await
        .map_err(error_response)?;
    metrics::games_started_total();
    Ok(Json(result))
}

/// Draw one card for the acting player and resolve the outcome.
///
/// # Response
///
/// ```json
/// {
///   "outcome": "continue",
///   "newScore": 19,
///   "newCard": {"value": "KING", "image": "https://..."}
/// }
/// ```
///
/// On a bust the body additionally carries `nextTurn`.
///
/// # Errors
///
/// - `400 Bad Request`: Out of turn, wrong deck token, or not in progress
/// - `502 Bad Gateway`: The draw failed upstream; the hand is unchanged
pub async fn hit(
    State(state): State<AppState>,
    Path(game_id): Path<SessionId>,
    Json(request): Json<HitRequest>,
) -> Result<Json<HitResult>, ApiError> {
    let result = state
        .manager
        .hit(game_id, request.player_id, request.deck_id)
        .await
        .map_err(error_response)?;
    metrics::hits_total();
    Ok(Json(result))
}

/// Lock in the acting player's score and pass the turn to the next member
/// in join order, skipping members who already stood.
///
/// The response omits `nextTurn` when every member has stood; the session
/// is concluded in that case.
pub async fn stand(
    State(state): State<AppState>,
    Path(game_id): Path<SessionId>,
    Json(request): Json<PlayerActionRequest>,
) -> Result<Json<StandResult>, ApiError> {
    state
        .manager
        .stand(game_id, request.player_id)
        .await
        .map(Json)
        .map_err(error_response)
}
