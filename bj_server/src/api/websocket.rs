//! WebSocket handler for server-to-client push notifications.
//!
//! The push channel is one-directional after registration: clients connect,
//! identify themselves, and then only receive. All game actions go through
//! the HTTP API.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws`
//! 2. The first text frame must be `{"type": "register", "playerID": "..."}`
//! 3. The connection is registered as that player's notification channel,
//!    replacing any earlier connection for the same player
//! 4. Notifications are forwarded to the socket as JSON until either side
//!    closes
//!
//! Registry entries are not removed on disconnect; a stale channel fails at
//! delivery time and the broadcaster skips it. A reconnecting player simply
//! registers again.
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:3000/ws');
//! ws.onopen = () => ws.send(JSON.stringify({type: "register", playerID: "alice"}));
//! ws.onmessage = (event) => handleNotification(JSON.parse(event.data));
//! ```

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde::Deserialize;
use tokio::sync::mpsc;

use blackjack::PlayerId;
use blackjack::registry::NOTIFY_CHANNEL_CAPACITY;

use super::AppState;
use crate::metrics;

/// The only client-to-server frame the push channel accepts.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum ClientMessage {
    Register {
        #[serde(rename = "playerID")]
        player_id: PlayerId,
    },
}

/// Upgrade an HTTP connection to the notification WebSocket.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection.
///
/// Waits for the registration frame, then forwards notifications from the
/// player's channel to the socket until the client disconnects or the
/// channel is displaced by a newer registration.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // The first frame must identify the player.
    let player = loop {
        match receiver.next().await {
            Some(Ok(Message::Text(text))) => {
                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Register { player_id }) => break player_id,
                    Err(e) => {
                        warn!("rejecting WebSocket with bad registration frame: {e}");
                        let _ = sender.close().await;
                        return;
                    }
                }
            }
            // Pings and the like before registration are tolerated.
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            _ => {
                debug!("WebSocket closed before registering");
                return;
            }
        }
    };

    info!("WebSocket registered for {player}");
    metrics::websocket_connections_total();

    let (notification_tx, mut notification_rx) = mpsc::channel(NOTIFY_CHANNEL_CAPACITY);
    state.registry.register(player.clone(), notification_tx).await;

    loop {
        tokio::select! {
            notification = notification_rx.recv() => {
                // The channel closes when a newer connection for the same
                // player displaces this one.
                let Some(notification) = notification else {
                    debug!("notification channel for {player} displaced, closing socket");
                    break;
                };
                let json = match serde_json::to_string(&notification) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("failed to serialize notification for {player}: {e}");
                        continue;
                    }
                };
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
                metrics::websocket_notifications_sent();
            }
            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {
                        // Post-registration client frames carry no meaning.
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error for {player}: {e}");
                        break;
                    }
                }
            }
        }
    }

    // No registry cleanup: the stale channel is skipped at delivery time
    // and overwritten on reconnect.
    info!("WebSocket disconnected for {player}");
}
