//! # Blackjack
//!
//! A multiplayer blackjack coordinator: many independent game sessions, each
//! with a host-selected set of players, a single turn holder, and running
//! scores derived from dealt cards.
//!
//! The hard part of the domain is session and turn coordination under
//! concurrent, asynchronously-arriving client connections and actions.
//! Every session is owned by a dedicated actor task with an mpsc inbox, so
//! all mutations of one session are serialized while different sessions
//! proceed fully in parallel. Connected clients are tracked by a registry
//! that maps a durable player identity to a live outbound channel, and every
//! player-visible state change is pushed best-effort to exactly the right
//! subset of players.
//!
//! ## Core Modules
//!
//! - [`game`]: Session state, lifecycle, and the turn state machine
//! - [`session`]: Session actors and the session manager (the session store)
//! - [`registry`]: Player identity to live connection channel mapping
//! - [`broadcast`]: Notification payloads and target selection
//! - [`deck`]: External shuffled-deck / draw service clients
//! - [`db`]: Player and game persistence repositories
//!
//! ## Example
//!
//! ```
//! use blackjack::game::GameSession;
//!
//! // A new session forms with the host as its only member.
//! let session = GameSession::new(uuid::Uuid::new_v4(), "host-1".into());
//! assert_eq!(session.members().len(), 1);
//! ```

/// Notification payloads and best-effort delivery.
pub mod broadcast;
/// Persistence repositories for players and game history.
pub mod db;
/// Draw service clients (HTTP and in-process).
pub mod deck;
/// Core session state and turn state machine.
pub mod game;
/// Connection registry mapping players to live channels.
pub mod registry;
/// Session actors and the session manager.
pub mod session;

pub use broadcast::{Broadcaster, Notification};
pub use game::{
    GameError, GameSession, Lifecycle,
    entities::{DeckToken, DrawnCard, Hand, Outcome, PlayerId, SessionId, TARGET_SCORE},
};
pub use registry::ConnectionRegistry;
pub use session::{SessionHandle, SessionManager};
