//! Session actor: the serialized mutation path for one game session.
//!
//! Each session is owned by exactly one actor task. All joins, deals, hits,
//! and stands flow through its mpsc inbox, which makes every mutation atomic
//! with respect to the others on the same session; sessions never share an
//! actor, so distinct games proceed fully in parallel. Draw-service calls
//! happen inside the actor, after validation and before any session field is
//! touched, so a failed or timed-out draw leaves the session unmutated.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rand::{SeedableRng, rngs::StdRng};
use tokio::sync::{RwLock, mpsc, oneshot};

use super::messages::{SessionMessage, SessionSnapshot, StandResult, StartResult};
use crate::broadcast::Broadcaster;
use crate::db::{GameRecord, GameRepository};
use crate::deck::DeckService;
use crate::game::entities::{DeckToken, PlayerId, SessionId};
use crate::game::errors::{GameError, GameResult};
use crate::game::session::{GameSession, HitResult};

/// Inbox depth per session actor.
const SESSION_INBOX_CAPACITY: usize = 64;

/// Cloneable handle for sending requests to a session actor.
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionMessage>,
    id: SessionId,
}

impl SessionHandle {
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    async fn send(&self, message: SessionMessage) -> GameResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| GameError::SessionClosed)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<GameResult<T>>) -> SessionMessage,
    ) -> GameResult<T> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;
        rx.await.map_err(|_| GameError::SessionClosed)?
    }

    pub async fn join(&self, player: PlayerId) -> GameResult<PlayerId> {
        self.request(|response| SessionMessage::Join { player, response })
            .await
    }

    pub async fn start(&self, player: PlayerId) -> GameResult<StartResult> {
        self.request(|response| SessionMessage::Start { player, response })
            .await
    }

    pub async fn hit(&self, player: PlayerId, deck: DeckToken) -> GameResult<HitResult> {
        self.request(|response| SessionMessage::Hit {
            player,
            deck,
            response,
        })
        .await
    }

    pub async fn stand(&self, player: PlayerId) -> GameResult<StandResult> {
        self.request(|response| SessionMessage::Stand { player, response })
            .await
    }

    pub async fn snapshot(&self) -> GameResult<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionMessage::GetState { response: tx }).await?;
        rx.await.map_err(|_| GameError::SessionClosed)
    }
}

/// Actor owning a single [`GameSession`].
pub struct SessionActor {
    session: GameSession,
    inbox: mpsc::Receiver<SessionMessage>,
    deck_service: Arc<dyn DeckService>,
    broadcaster: Arc<Broadcaster>,
    games: Arc<dyn GameRepository>,
    /// Shared exclusivity index owned by the manager; this actor releases
    /// its members when the session concludes.
    active_players: Arc<RwLock<HashMap<PlayerId, SessionId>>>,
    rng: StdRng,
}

impl SessionActor {
    pub fn new(
        id: SessionId,
        host: PlayerId,
        deck_service: Arc<dyn DeckService>,
        broadcaster: Arc<Broadcaster>,
        games: Arc<dyn GameRepository>,
        active_players: Arc<RwLock<HashMap<PlayerId, SessionId>>>,
    ) -> (Self, SessionHandle) {
        Self::with_rng(
            id,
            host,
            deck_service,
            broadcaster,
            games,
            active_players,
            StdRng::from_os_rng(),
        )
    }

    /// Like [`SessionActor::new`] with an explicit RNG, so the bust handoff
    /// is reproducible in tests.
    pub fn with_rng(
        id: SessionId,
        host: PlayerId,
        deck_service: Arc<dyn DeckService>,
        broadcaster: Arc<Broadcaster>,
        games: Arc<dyn GameRepository>,
        active_players: Arc<RwLock<HashMap<PlayerId, SessionId>>>,
        rng: StdRng,
    ) -> (Self, SessionHandle) {
        let (sender, inbox) = mpsc::channel(SESSION_INBOX_CAPACITY);
        let actor = Self {
            session: GameSession::new(id, host),
            inbox,
            deck_service,
            broadcaster,
            games,
            active_players,
            rng,
        };
        (actor, SessionHandle { sender, id })
    }

    /// Run the actor event loop until every handle is dropped. Concluded
    /// sessions keep answering snapshots (and rejecting actions) so late
    /// requests get a proper error rather than a closed channel.
    pub async fn run(mut self) {
        let id = self.session.id();
        log::info!("session {id} actor started");

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message).await;
        }

        log::info!("session {id} actor stopped");
    }

    async fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Join { player, response } => {
                let result = self.handle_join(player).await;
                let _ = response.send(result);
            }
            SessionMessage::Start { player, response } => {
                let result = self.handle_start(player).await;
                let _ = response.send(result);
            }
            SessionMessage::Hit {
                player,
                deck,
                response,
            } => {
                let result = self.handle_hit(player, deck).await;
                let _ = response.send(result);
            }
            SessionMessage::Stand { player, response } => {
                let result = self.handle_stand(player).await;
                let _ = response.send(result);
            }
            SessionMessage::GetState { response } => {
                let _ = response.send(self.snapshot());
            }
        }
    }

    async fn handle_join(&mut self, player: PlayerId) -> GameResult<PlayerId> {
        let host = self.session.add_member(player.clone())?;
        self.persist().await;

        log::info!(
            "{player} joined session {} ({} members)",
            self.session.id(),
            self.session.members().len()
        );
        self.broadcaster.player_joined(&host, &player).await;
        Ok(host)
    }

    async fn handle_start(&mut self, caller: PlayerId) -> GameResult<StartResult> {
        // Validate before spending draw-service calls.
        self.session.ensure_can_start(&caller)?;

        let deck = self.deck_service.new_shuffled_deck().await?;
        let count = 2 * self.session.members().len();
        let cards = self.deck_service.draw_cards(&deck, count).await?;

        let hands = self.session.begin(&caller, deck.clone(), cards)?;
        self.persist().await;

        log::info!(
            "session {} started with {} players",
            self.session.id(),
            hands.len()
        );
        self.broadcaster.game_started(&hands).await;
        self.broadcaster
            .turn_changed(self.session.members(), self.session.host())
            .await;

        Ok(StartResult {
            deck_token: deck,
            hands,
        })
    }

    async fn handle_hit(&mut self, player: PlayerId, deck: DeckToken) -> GameResult<HitResult> {
        // Draw into a temporary only after the request is known to be
        // valid; an upstream failure here leaves the session untouched.
        self.session.ensure_can_hit(&player, &deck)?;
        let mut cards = self.deck_service.draw_cards(&deck, 1).await?;
        let card = cards
            .pop()
            .ok_or_else(|| GameError::UpstreamDraw(crate::deck::DeckError::Exhausted(deck.clone())))?;

        let result = self.session.apply_hit(&player, &deck, card, &mut self.rng)?;
        self.persist().await;

        log::debug!(
            "session {}: {player} hit, {} at {}",
            self.session.id(),
            result.outcome,
            result.new_score
        );
        self.broadcaster
            .round_result(
                self.session.members(),
                &player,
                result.outcome,
                result.new_score,
            )
            .await;
        if let Some(next) = &result.next_turn {
            self.broadcaster
                .turn_changed(self.session.members(), next)
                .await;
        }

        if self.session.is_concluded() {
            self.release_members().await;
        }

        Ok(result)
    }

    async fn handle_stand(&mut self, player: PlayerId) -> GameResult<StandResult> {
        let next_turn = self.session.apply_stand(&player)?;
        let final_score = self
            .session
            .hand(&player)
            .map(|hand| hand.score)
            .unwrap_or_default();
        self.persist().await;

        log::debug!(
            "session {}: {player} stands at {final_score}",
            self.session.id()
        );
        if let Some(next) = &next_turn {
            self.broadcaster
                .turn_changed(self.session.members(), next)
                .await;
        }

        if self.session.is_concluded() {
            self.release_members().await;
        }

        Ok(StandResult {
            next_turn,
            final_score,
        })
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.session.id(),
            host: self.session.host().clone(),
            members: self.session.members().to_vec(),
            state: self.session.state(),
            current_turn: self.session.current_turn().cloned(),
            scores: self.session.scores(),
        }
    }

    /// Mirror the session into the game record store. The in-memory session
    /// is authoritative; a persistence hiccup is logged and does not fail
    /// the action that triggered it.
    async fn persist(&self) {
        let record = GameRecord {
            id: self.session.id(),
            host: self.session.host().clone(),
            members: self.session.members().to_vec(),
            state: self.session.state(),
            current_turn: self.session.current_turn().cloned(),
            updated_at: Utc::now(),
        };
        if let Err(e) = self.games.update_game(&record).await {
            log::warn!(
                "failed to persist session {}: {e}",
                self.session.id()
            );
        }
    }

    /// Free this session's members for new sessions once it has concluded.
    async fn release_members(&self) {
        let id = self.session.id();
        let mut active = self.active_players.write().await;
        for member in self.session.members() {
            if active.get(member) == Some(&id) {
                active.remove(member);
            }
        }
    }
}
