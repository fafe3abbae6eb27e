//! HTTP/WebSocket server for the multiplayer blackjack coordinator.
//!
//! The binary wires the blackjack library's session manager, connection
//! registry, and repositories behind an Axum router. The library target
//! exists so integration tests can build the router against in-memory
//! repositories.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
