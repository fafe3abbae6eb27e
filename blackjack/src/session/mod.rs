//! Session store: one actor task per game session plus a manager that
//! spawns actors, routes requests, and enforces cross-session exclusivity.

pub mod actor;
pub mod manager;
pub mod messages;

pub use actor::{SessionActor, SessionHandle};
pub use manager::SessionManager;
pub use messages::{SessionMessage, SessionSnapshot, StandResult, StartResult};
