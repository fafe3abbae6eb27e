//! WebSocket integration tests for the push notification channel.
//!
//! These bind a real listener so the upgrade handshake and frame forwarding
//! run end to end against an actual client.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use blackjack::broadcast::Broadcaster;
use blackjack::db::{MemoryGameRepository, MemoryPlayerRepository};
use blackjack::deck::LocalDeckService;
use blackjack::game::entities::DrawnCard;
use blackjack::registry::ConnectionRegistry;
use blackjack::session::SessionManager;

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct TestServer {
    addr: SocketAddr,
    manager: Arc<SessionManager>,
    deck_service: Arc<LocalDeckService>,
}

/// Bind the full router on an ephemeral port and serve it in the
/// background.
async fn start_test_server() -> TestServer {
    let deck_service = Arc::new(LocalDeckService::new());
    let registry = Arc::new(ConnectionRegistry::new());
    let games = Arc::new(MemoryGameRepository::new());
    let manager = Arc::new(SessionManager::new(
        deck_service.clone(),
        Arc::new(Broadcaster::new(registry.clone())),
        games.clone(),
    ));

    let state = bj_server::api::AppState {
        manager: manager.clone(),
        registry,
        players: Arc::new(MemoryPlayerRepository::new()),
        games,
    };
    let app = bj_server::api::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        addr,
        manager,
        deck_service,
    }
}

/// Connect a client and register it under `player`. Delivery is
/// best-effort, so give the registration a moment to land before the test
/// triggers notifications.
async fn connect_registered(addr: SocketAddr, player: &str) -> WsClient {
    let (mut client, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let frame = json!({"type": "register", "playerID": player}).to_string();
    client.send(Message::Text(frame.into())).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    client
}

/// Wait for the next text frame and parse it.
async fn next_json(client: &mut WsClient) -> Value {
    let frame = timeout(Duration::from_secs(5), client.next())
        .await
        .expect("timed out waiting for a notification")
        .expect("connection closed")
        .unwrap();
    serde_json::from_str(frame.to_text().unwrap()).unwrap()
}

fn card(value: &str) -> DrawnCard {
    DrawnCard::new(value, "img")
}

#[tokio::test]
async fn host_is_notified_when_a_player_joins() {
    let server = start_test_server().await;
    let mut host_ws = connect_registered(server.addr, "alice").await;

    let id = server.manager.create_session("alice".into()).await.unwrap();
    server.manager.join_session(id, "bob".into()).await.unwrap();

    let notification = next_json(&mut host_ws).await;
    assert_eq!(notification["type"], "playerJoined");
    assert_eq!(notification["joinedPlayer"], "bob");
}

#[tokio::test]
async fn start_pushes_each_member_their_own_hand_then_the_turn() {
    let server = start_test_server().await;
    let mut host_ws = connect_registered(server.addr, "alice").await;
    let mut bob_ws = connect_registered(server.addr, "bob").await;

    let id = server.manager.create_session("alice".into()).await.unwrap();
    server.manager.join_session(id, "bob".into()).await.unwrap();
    // The join notification for the host arrives first.
    let joined = next_json(&mut host_ws).await;
    assert_eq!(joined["type"], "playerJoined");

    server
        .deck_service
        .stack_next_deck(vec![card("4"), card("5"), card("2"), card("3")])
        .await;
    server
        .manager
        .start_session(id, "alice".into())
        .await
        .unwrap();

    let host_started = next_json(&mut host_ws).await;
    assert_eq!(host_started["type"], "gameStarted");
    let host_cards = host_started["cards"].as_array().unwrap();
    assert_eq!(host_cards.len(), 2);
    assert_eq!(host_cards[0]["value"], "4");

    let bob_started = next_json(&mut bob_ws).await;
    assert_eq!(bob_started["type"], "gameStarted");
    assert_eq!(bob_started["cards"][0]["value"], "2");

    // Both members then hear who holds the first turn.
    for ws in [&mut host_ws, &mut bob_ws] {
        let turn = next_json(ws).await;
        assert_eq!(turn["type"], "playerTurn");
        assert_eq!(turn["playerID"], "alice");
    }
}

#[tokio::test]
async fn reconnecting_player_receives_on_the_newest_connection() {
    let server = start_test_server().await;
    let mut old_ws = connect_registered(server.addr, "alice").await;
    let mut new_ws = connect_registered(server.addr, "alice").await;

    let id = server.manager.create_session("alice".into()).await.unwrap();
    server.manager.join_session(id, "bob".into()).await.unwrap();

    let notification = next_json(&mut new_ws).await;
    assert_eq!(notification["type"], "playerJoined");

    // The displaced connection is closed by the server rather than fed.
    let old_outcome = timeout(Duration::from_secs(5), old_ws.next()).await;
    match old_outcome {
        Ok(None) | Ok(Some(Ok(Message::Close(_)))) => {}
        other => panic!("expected the old connection to close, got {other:?}"),
    }
}

#[tokio::test]
async fn bad_registration_frame_closes_the_connection() {
    let server = start_test_server().await;
    let (mut client, _) = connect_async(format!("ws://{}/ws", server.addr))
        .await
        .unwrap();
    client
        .send(Message::Text("not even json".into()))
        .await
        .unwrap();

    let outcome = timeout(Duration::from_secs(5), client.next()).await.unwrap();
    match outcome {
        None | Some(Ok(Message::Close(_))) => {}
        other => panic!("expected close, got {other:?}"),
    }
}

#[tokio::test]
async fn actions_without_a_connection_still_succeed() {
    // Notification delivery is best-effort: nobody is connected, and the
    // game proceeds regardless.
    let server = start_test_server().await;
    let id = server.manager.create_session("alice".into()).await.unwrap();
    server.manager.join_session(id, "bob".into()).await.unwrap();
    server
        .manager
        .start_session(id, "alice".into())
        .await
        .unwrap();
}
