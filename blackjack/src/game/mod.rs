//! Core game logic: entities, errors, and the session turn state machine.

pub mod entities;
pub mod errors;
pub mod session;

pub use entities::{DeckToken, DrawnCard, Hand, Outcome, PlayerId, SessionId, TARGET_SCORE};
pub use errors::GameError;
pub use session::{GameSession, HitResult, Lifecycle};
