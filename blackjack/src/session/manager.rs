//! Session manager: spawns one actor per session, routes requests to the
//! right actor, and enforces that a player belongs to at most one
//! non-concluded session at a time.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::actor::{SessionActor, SessionHandle};
use super::messages::{SessionSnapshot, StandResult, StartResult};
use crate::broadcast::Broadcaster;
use crate::db::{GameRecord, GameRepository};
use crate::deck::DeckService;
use crate::game::entities::{DeckToken, PlayerId, SessionId};
use crate::game::errors::{GameError, GameResult};
use crate::game::session::HitResult;

/// Owns the live session handles and the cross-session exclusivity index.
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
    /// Players currently in a non-concluded session. Entries are reserved
    /// here before the session sees the player and removed by the actor on
    /// conclusion, so the busy check and the insert are one atomic step.
    active_players: Arc<RwLock<HashMap<PlayerId, SessionId>>>,
    deck_service: Arc<dyn DeckService>,
    broadcaster: Arc<Broadcaster>,
    games: Arc<dyn GameRepository>,
}

impl SessionManager {
    #[must_use]
    pub fn new(
        deck_service: Arc<dyn DeckService>,
        broadcaster: Arc<Broadcaster>,
        games: Arc<dyn GameRepository>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            active_players: Arc::new(RwLock::new(HashMap::new())),
            deck_service,
            broadcaster,
            games,
        }
    }

    /// Create a new session hosted by `host` and spawn its actor. Fails
    /// with [`GameError::PlayerBusy`] if the host is already in a
    /// non-concluded session.
    pub async fn create_session(&self, host: PlayerId) -> GameResult<SessionId> {
        let id = Uuid::new_v4();
        self.reserve(&host, id).await?;

        // Record the session before it becomes reachable; failing here
        // rolls the reservation back so the host is not stranded.
        let record = GameRecord::forming(id, host.clone());
        if let Err(e) = self.games.put_game(&record).await {
            self.release(&host, id).await;
            return Err(GameError::Store(e));
        }

        let (actor, handle) = SessionActor::new(
            id,
            host.clone(),
            Arc::clone(&self.deck_service),
            Arc::clone(&self.broadcaster),
            Arc::clone(&self.games),
            Arc::clone(&self.active_players),
        );
        self.sessions.write().await.insert(id, handle);
        tokio::spawn(actor.run());

        log::info!("{host} created session {id}");
        Ok(id)
    }

    /// Join `player` to an existing forming session. Answers with the host
    /// identity so the caller can address the lobby owner.
    pub async fn join_session(&self, id: SessionId, player: PlayerId) -> GameResult<PlayerId> {
        let handle = self.get(id).await?;
        self.reserve(&player, id).await?;

        match handle.join(player.clone()).await {
            Ok(host) => Ok(host),
            Err(e) => {
                // The actor rejected the join; the reservation must not
                // outlive it.
                self.release(&player, id).await;
                Err(e)
            }
        }
    }

    pub async fn start_session(&self, id: SessionId, player: PlayerId) -> GameResult<StartResult> {
        self.get(id).await?.start(player).await
    }

    pub async fn hit(
        &self,
        id: SessionId,
        player: PlayerId,
        deck: DeckToken,
    ) -> GameResult<HitResult> {
        self.get(id).await?.hit(player, deck).await
    }

    pub async fn stand(&self, id: SessionId, player: PlayerId) -> GameResult<StandResult> {
        self.get(id).await?.stand(player).await
    }

    pub async fn snapshot(&self, id: SessionId) -> GameResult<SessionSnapshot> {
        self.get(id).await?.snapshot().await
    }

    pub async fn get(&self, id: SessionId) -> GameResult<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(GameError::SessionNotFound)
    }

    /// Number of sessions with live actors, for metrics.
    pub async fn active_session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn reserve(&self, player: &PlayerId, id: SessionId) -> GameResult<()> {
        let mut active = self.active_players.write().await;
        if active.contains_key(player) {
            return Err(GameError::PlayerBusy(player.clone()));
        }
        active.insert(player.clone(), id);
        Ok(())
    }

    async fn release(&self, player: &PlayerId, id: SessionId) {
        let mut active = self.active_players.write().await;
        if active.get(player) == Some(&id) {
            active.remove(player);
        }
    }
}
