//! Game error types.

use thiserror::Error;

use super::entities::PlayerId;
use super::session::Lifecycle;
use crate::db::StoreError;
use crate::deck::DeckError;

/// Errors that can occur while coordinating a session.
#[derive(Debug, Error)]
pub enum GameError {
    /// Unknown session identifier.
    #[error("session not found")]
    SessionNotFound,

    /// The player already belongs to a non-concluded session.
    #[error("{0} is already in an active session")]
    PlayerBusy(PlayerId),

    /// The requested action is illegal in the session's lifecycle state.
    #[error("action not allowed while session is {0}")]
    InvalidState(Lifecycle),

    /// The acting player is not the current turn holder.
    #[error("not your turn")]
    OutOfTurn,

    /// The supplied deck token is not the one assigned to this session.
    #[error("deck token does not match this session")]
    DeckMismatch,

    /// Play cannot start with fewer than two members.
    #[error("need 2+ players")]
    NotEnoughPlayers,

    /// Only the session host may start play.
    #[error("only the host can start the game")]
    NotHost,

    /// The external draw service failed or timed out. Retryable by the
    /// caller; the session is left unmutated.
    #[error("draw service unavailable: {0}")]
    UpstreamDraw(#[from] DeckError),

    /// Persistence failure surfaced from the record store.
    #[error("persistence error: {0}")]
    Store(#[from] StoreError),

    /// The session actor has stopped and can no longer accept requests.
    #[error("session is closed")]
    SessionClosed,
}

/// Result type for game operations.
pub type GameResult<T> = Result<T, GameError>;
