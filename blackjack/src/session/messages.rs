//! Session actor message types.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::game::entities::{DeckToken, Hand, PlayerId, SessionId};
use crate::game::errors::GameResult;
use crate::game::session::{HitResult, Lifecycle};

/// Messages that can be sent to a session actor. Each request carries a
/// oneshot responder; the inbox is the per-session single-writer queue that
/// serializes all mutations.
#[derive(Debug)]
pub enum SessionMessage {
    /// Add a player to the forming session. Answers with the host identity.
    Join {
        player: PlayerId,
        response: oneshot::Sender<GameResult<PlayerId>>,
    },

    /// Host-issued start: acquire a deck, deal, hand the turn to the host.
    Start {
        player: PlayerId,
        response: oneshot::Sender<GameResult<StartResult>>,
    },

    /// Draw one card for the acting player and resolve the outcome.
    Hit {
        player: PlayerId,
        deck: DeckToken,
        response: oneshot::Sender<GameResult<HitResult>>,
    },

    /// Lock in the acting player's score and pass the turn onward.
    Stand {
        player: PlayerId,
        response: oneshot::Sender<GameResult<StandResult>>,
    },

    /// Read-only snapshot of the session.
    GetState {
        response: oneshot::Sender<SessionSnapshot>,
    },
}

/// Result of a successful start.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResult {
    pub deck_token: DeckToken,
    /// Initial two-card hands in join order.
    pub hands: Vec<(PlayerId, Hand)>,
}

/// Result of a successful stand.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandResult {
    /// Absent when every member has stood and the session concluded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_turn: Option<PlayerId>,
    pub final_score: u32,
}

/// Point-in-time view of a session.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub host: PlayerId,
    pub members: Vec<PlayerId>,
    pub state: Lifecycle,
    pub current_turn: Option<PlayerId>,
    pub scores: std::collections::HashMap<PlayerId, u32>,
}
