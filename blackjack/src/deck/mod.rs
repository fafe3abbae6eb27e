//! Draw service clients.
//!
//! The shuffling/draw service is an external collaborator that issues opaque
//! deck tokens and hands out cards. It is treated as unreliable and
//! rate-bound: every failure mode, including a timeout, surfaces as a
//! [`DeckError`] so the action processor can reject the triggering request
//! without half-mutating the session.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::game::entities::{DeckToken, DrawnCard};

pub mod http;
pub mod local;

pub use http::HttpDeckService;
pub use local::LocalDeckService;

/// Errors from the draw service boundary.
#[derive(Debug, Error)]
pub enum DeckError {
    /// The request could not be completed (network, protocol, 5xx, ...).
    #[error("draw request failed: {0}")]
    Transport(String),

    /// The request did not complete within the configured bound.
    #[error("draw request timed out after {0:?}")]
    Timeout(Duration),

    /// The deck is unknown to the service or has no cards left.
    #[error("deck {0} is unknown or exhausted")]
    Exhausted(DeckToken),

    /// The service answered with something we cannot use.
    #[error("malformed draw response: {0}")]
    Malformed(String),
}

/// Result type for draw service operations.
pub type DeckResult<T> = Result<T, DeckError>;

/// External shuffled-deck issuer and card source.
#[async_trait]
pub trait DeckService: Send + Sync {
    /// Ask the service for a freshly shuffled deck.
    async fn new_shuffled_deck(&self) -> DeckResult<DeckToken>;

    /// Draw exactly `count` cards from the identified deck.
    async fn draw_cards(&self, deck: &DeckToken, count: usize) -> DeckResult<Vec<DrawnCard>>;
}
