//! Connection registry mapping a durable player identity to its live
//! outbound notification channel.
//!
//! The registry is the sole owner of channel references. Registration is
//! unconditional and last-registered-wins: a reconnecting player's new
//! channel silently replaces the old one, with no eviction signal to the
//! displaced handle. Entries are not proactively removed when a connection
//! closes; a stale channel simply fails at delivery time and the broadcaster
//! skips it.

use std::collections::HashMap;

use tokio::sync::{RwLock, mpsc};

use crate::broadcast::Notification;
use crate::game::PlayerId;

/// Bound on buffered notifications per connection. A client that cannot
/// drain this many pending pushes starts dropping them.
pub const NOTIFY_CHANNEL_CAPACITY: usize = 32;

/// Live channel capable of pushing asynchronous notifications to one
/// registered player.
pub type ConnectionHandle = mpsc::Sender<Notification>;

/// Guarded map from player identity to connection handle.
#[derive(Default)]
pub struct ConnectionRegistry {
    channels: RwLock<HashMap<PlayerId, ConnectionHandle>>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `handle` with `player`, replacing any prior handle.
    /// Overwriting is the defined behavior for reconnects.
    pub async fn register(&self, player: PlayerId, handle: ConnectionHandle) {
        let mut channels = self.channels.write().await;
        if channels.insert(player.clone(), handle).is_some() {
            log::debug!("replaced connection handle for {player}");
        } else {
            log::debug!("registered connection handle for {player}");
        }
    }

    /// Look up the current handle for `player`. Absence means the player is
    /// currently unreachable, not an error.
    pub async fn lookup(&self, player: &PlayerId) -> Option<ConnectionHandle> {
        let channels = self.channels.read().await;
        channels.get(player).cloned()
    }

    /// Number of registered channels, live or stale.
    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.channels.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_of_unknown_player_is_absent() {
        let registry = ConnectionRegistry::new();
        assert!(registry.lookup(&"ghost".into()).await.is_none());
    }

    #[tokio::test]
    async fn register_then_lookup_round_trips() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = mpsc::channel(NOTIFY_CHANNEL_CAPACITY);
        registry.register("alice".into(), tx).await;

        let handle = registry.lookup(&"alice".into()).await.unwrap();
        handle
            .try_send(Notification::PlayerTurn {
                player_id: "alice".into(),
            })
            .unwrap();
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn later_registration_wins() {
        let registry = ConnectionRegistry::new();
        let (old_tx, mut old_rx) = mpsc::channel(NOTIFY_CHANNEL_CAPACITY);
        let (new_tx, mut new_rx) = mpsc::channel(NOTIFY_CHANNEL_CAPACITY);
        registry.register("alice".into(), old_tx).await;
        registry.register("alice".into(), new_tx).await;
        assert_eq!(registry.len().await, 1);

        let handle = registry.lookup(&"alice".into()).await.unwrap();
        handle
            .try_send(Notification::PlayerTurn {
                player_id: "alice".into(),
            })
            .unwrap();
        assert!(new_rx.recv().await.is_some());
        assert!(old_rx.try_recv().is_err());
    }
}
