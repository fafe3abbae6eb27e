//! Repository trait definitions and their PostgreSQL implementations.
//!
//! Trait-based abstractions over the record store keep the session
//! coordinator independent of the concrete database and allow tests to run
//! against in-memory implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};

use super::{StoreError, StoreResult};
use crate::game::entities::{PlayerId, SessionId};
use crate::game::session::Lifecycle;

/// Persisted player record. Identities accumulate; there is no deletion
/// path.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    #[serde(rename = "playerID")]
    pub id: PlayerId,
    pub score: i64,
    pub created_at: DateTime<Utc>,
}

/// Persisted game record for audit/history. Concluded sessions are
/// retained, never deleted.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: SessionId,
    pub host: PlayerId,
    pub members: Vec<PlayerId>,
    pub state: Lifecycle,
    pub current_turn: Option<PlayerId>,
    pub updated_at: DateTime<Utc>,
}

impl GameRecord {
    /// Snapshot of a freshly created session.
    #[must_use]
    pub fn forming(id: SessionId, host: PlayerId) -> Self {
        Self {
            id,
            members: vec![host.clone()],
            host,
            state: Lifecycle::Forming,
            current_turn: None,
            updated_at: Utc::now(),
        }
    }
}

/// Keyed player record store.
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    /// Register a player identity. Idempotent: registering an existing
    /// identity returns the existing record unchanged.
    async fn put_player(&self, id: &PlayerId) -> StoreResult<PlayerRecord>;

    async fn get_player(&self, id: &PlayerId) -> StoreResult<Option<PlayerRecord>>;

    async fn list_players(&self) -> StoreResult<Vec<PlayerRecord>>;
}

/// Keyed game record store.
#[async_trait]
pub trait GameRepository: Send + Sync {
    /// Record a newly created session.
    async fn put_game(&self, record: &GameRecord) -> StoreResult<()>;

    /// Overwrite the mutable fields of an existing game record.
    async fn update_game(&self, record: &GameRecord) -> StoreResult<()>;

    async fn list_games(&self) -> StoreResult<Vec<GameRecord>>;
}

fn lifecycle_to_str(state: Lifecycle) -> &'static str {
    match state {
        Lifecycle::Forming => "forming",
        Lifecycle::InProgress => "in_progress",
        Lifecycle::Concluded => "concluded",
    }
}

fn lifecycle_from_str(s: &str) -> Lifecycle {
    match s {
        "in_progress" => Lifecycle::InProgress,
        "concluded" => Lifecycle::Concluded,
        _ => Lifecycle::Forming,
    }
}

/// PostgreSQL implementation of [`PlayerRepository`].
pub struct PgPlayerRepository {
    pool: PgPool,
}

impl PgPlayerRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlayerRepository for PgPlayerRepository {
    async fn put_player(&self, id: &PlayerId) -> StoreResult<PlayerRecord> {
        sqlx::query("INSERT INTO players (id, score) VALUES ($1, 0) ON CONFLICT (id) DO NOTHING")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        self.get_player(id).await?.ok_or(StoreError::PlayerNotFound)
    }

    async fn get_player(&self, id: &PlayerId) -> StoreResult<Option<PlayerRecord>> {
        let row = sqlx::query("SELECT id, score, created_at FROM players WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| PlayerRecord {
            id: PlayerId::from(r.get::<String, _>("id")),
            score: r.get("score"),
            created_at: r.get("created_at"),
        }))
    }

    async fn list_players(&self) -> StoreResult<Vec<PlayerRecord>> {
        let rows = sqlx::query("SELECT id, score, created_at FROM players ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| PlayerRecord {
                id: PlayerId::from(r.get::<String, _>("id")),
                score: r.get("score"),
                created_at: r.get("created_at"),
            })
            .collect())
    }
}

/// PostgreSQL implementation of [`GameRepository`].
pub struct PgGameRepository {
    pool: PgPool,
}

impl PgGameRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GameRepository for PgGameRepository {
    async fn put_game(&self, record: &GameRecord) -> StoreResult<()> {
        let members: Vec<String> = record.members.iter().map(|m| m.to_string()).collect();
        sqlx::query(
            "INSERT INTO games (id, host, members, state, current_turn, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id)
        .bind(record.host.as_str())
        .bind(&members)
        .bind(lifecycle_to_str(record.state))
        .bind(record.current_turn.as_ref().map(PlayerId::as_str))
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_game(&self, record: &GameRecord) -> StoreResult<()> {
        let members: Vec<String> = record.members.iter().map(|m| m.to_string()).collect();
        let result = sqlx::query(
            "UPDATE games
             SET members = $2, state = $3, current_turn = $4, updated_at = $5
             WHERE id = $1",
        )
        .bind(record.id)
        .bind(&members)
        .bind(lifecycle_to_str(record.state))
        .bind(record.current_turn.as_ref().map(PlayerId::as_str))
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::GameNotFound);
        }
        Ok(())
    }

    async fn list_games(&self) -> StoreResult<Vec<GameRecord>> {
        let rows = sqlx::query(
            "SELECT id, host, members, state, current_turn, updated_at
             FROM games ORDER BY updated_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| GameRecord {
                id: r.get("id"),
                host: PlayerId::from(r.get::<String, _>("host")),
                members: r
                    .get::<Vec<String>, _>("members")
                    .into_iter()
                    .map(PlayerId::from)
                    .collect(),
                state: lifecycle_from_str(&r.get::<String, _>("state")),
                current_turn: r
                    .get::<Option<String>, _>("current_turn")
                    .map(PlayerId::from),
                updated_at: r.get("updated_at"),
            })
            .collect())
    }
}
