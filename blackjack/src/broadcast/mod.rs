//! Push notifications: payload computation, target selection, and
//! best-effort delivery through the connection registry.
//!
//! Delivery never fails the triggering request. A missing or dead channel is
//! skipped and logged; the remaining targets still receive their copy.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::game::entities::{DrawnCard, Hand, Outcome, PlayerId};
use crate::registry::ConnectionRegistry;

/// Server-to-client push message, tagged by kind.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notification {
    /// A player joined a forming session. Sent to the host only.
    PlayerJoined {
        #[serde(rename = "joinedPlayer")]
        joined_player: PlayerId,
    },
    /// Play began. Sent to each member individually, carrying only that
    /// member's own dealt hand.
    GameStarted { cards: Vec<DrawnCard> },
    /// The turn holder changed. Broadcast to all members.
    PlayerTurn {
        #[serde(rename = "playerID")]
        player_id: PlayerId,
    },
    /// A hit resolved. Broadcast to all members.
    RoundResult {
        #[serde(rename = "playerID")]
        player_id: PlayerId,
        outcome: Outcome,
        score: u32,
    },
}

/// Computes notification payloads and pushes them to the affected players.
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Notify the host that `joined` entered the session.
    pub async fn player_joined(&self, host: &PlayerId, joined: &PlayerId) {
        self.deliver(
            host,
            Notification::PlayerJoined {
                joined_player: joined.clone(),
            },
        )
        .await;
    }

    /// Notify every member of their own dealt hand. No member ever sees
    /// another member's cards.
    pub async fn game_started(&self, hands: &[(PlayerId, Hand)]) {
        for (member, hand) in hands {
            self.deliver(
                member,
                Notification::GameStarted {
                    cards: hand.cards.clone(),
                },
            )
            .await;
        }
    }

    /// Tell all members who holds the turn now.
    pub async fn turn_changed(&self, members: &[PlayerId], holder: &PlayerId) {
        for member in members {
            self.deliver(
                member,
                Notification::PlayerTurn {
                    player_id: holder.clone(),
                },
            )
            .await;
        }
    }

    /// Tell all members how a hit resolved.
    pub async fn round_result(
        &self,
        members: &[PlayerId],
        player: &PlayerId,
        outcome: Outcome,
        score: u32,
    ) {
        for member in members {
            self.deliver(
                member,
                Notification::RoundResult {
                    player_id: player.clone(),
                    outcome,
                    score,
                },
            )
            .await;
        }
    }

    /// Single delivery attempt. The channel reference is never held beyond
    /// this call.
    async fn deliver(&self, target: &PlayerId, notification: Notification) {
        let Some(handle) = self.registry.lookup(target).await else {
            log::debug!("{target} has no live connection, skipping notification");
            return;
        };
        match handle.try_send(notification) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::warn!("notification channel for {target} is full, dropping");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                log::debug!("connection for {target} is gone, dropping notification");
            }
        }
    }
}
