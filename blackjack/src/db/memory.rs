//! In-memory repository implementations backing tests and database-less
//! deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::repository::{GameRecord, GameRepository, PlayerRecord, PlayerRepository};
use super::{StoreError, StoreResult};
use crate::game::entities::{PlayerId, SessionId};

/// In-memory [`PlayerRepository`].
#[derive(Default)]
pub struct MemoryPlayerRepository {
    players: RwLock<HashMap<PlayerId, PlayerRecord>>,
}

impl MemoryPlayerRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlayerRepository for MemoryPlayerRepository {
    async fn put_player(&self, id: &PlayerId) -> StoreResult<PlayerRecord> {
        let mut players = self.players.write().await;
        let record = players.entry(id.clone()).or_insert_with(|| PlayerRecord {
            id: id.clone(),
            score: 0,
            created_at: Utc::now(),
        });
        Ok(record.clone())
    }

    async fn get_player(&self, id: &PlayerId) -> StoreResult<Option<PlayerRecord>> {
        Ok(self.players.read().await.get(id).cloned())
    }

    async fn list_players(&self) -> StoreResult<Vec<PlayerRecord>> {
        let mut records: Vec<_> = self.players.read().await.values().cloned().collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }
}

/// In-memory [`GameRepository`].
#[derive(Default)]
pub struct MemoryGameRepository {
    games: RwLock<HashMap<SessionId, GameRecord>>,
}

impl MemoryGameRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct lookup, handy for assertions in tests.
    pub async fn get_game(&self, id: SessionId) -> Option<GameRecord> {
        self.games.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl GameRepository for MemoryGameRepository {
    async fn put_game(&self, record: &GameRecord) -> StoreResult<()> {
        self.games
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(())
    }

    async fn update_game(&self, record: &GameRecord) -> StoreResult<()> {
        let mut games = self.games.write().await;
        if !games.contains_key(&record.id) {
            return Err(StoreError::GameNotFound);
        }
        games.insert(record.id, record.clone());
        Ok(())
    }

    async fn list_games(&self) -> StoreResult<Vec<GameRecord>> {
        let mut records: Vec<_> = self.games.read().await.values().cloned().collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }
}
