//! End-to-end coordinator tests: manager, session actors, broadcaster, and
//! the in-process draw service working together.

use std::sync::Arc;

use tokio::sync::mpsc;

use blackjack::broadcast::{Broadcaster, Notification};
use blackjack::db::MemoryGameRepository;
use blackjack::deck::LocalDeckService;
use blackjack::game::entities::{DrawnCard, PlayerId};
use blackjack::registry::{ConnectionRegistry, NOTIFY_CHANNEL_CAPACITY};
use blackjack::session::SessionManager;
use blackjack::{GameError, Lifecycle, Outcome};

struct Harness {
    manager: SessionManager,
    deck_service: Arc<LocalDeckService>,
    registry: Arc<ConnectionRegistry>,
    games: Arc<MemoryGameRepository>,
}

fn harness() -> Harness {
    let deck_service = Arc::new(LocalDeckService::new());
    let registry = Arc::new(ConnectionRegistry::new());
    let games = Arc::new(MemoryGameRepository::new());
    let manager = SessionManager::new(
        deck_service.clone(),
        Arc::new(Broadcaster::new(registry.clone())),
        games.clone(),
    );
    Harness {
        manager,
        deck_service,
        registry,
        games,
    }
}

fn card(value: &str) -> DrawnCard {
    DrawnCard::new(value, "img")
}

fn cards(values: &[&str]) -> Vec<DrawnCard> {
    values.iter().map(|v| card(v)).collect()
}

#[tokio::test]
async fn full_round_follows_the_scripted_deal() {
    let h = harness();
    let host = PlayerId::from("host");
    let bob = PlayerId::from("bob");

    let id = h.manager.create_session(host.clone()).await.unwrap();
    let joined_host = h.manager.join_session(id, bob.clone()).await.unwrap();
    assert_eq!(joined_host, host);

    // Initial deal plus the host's two hit cards.
    h.deck_service
        .stack_next_deck(cards(&["4", "5", "2", "3", "KING", "5"]))
        .await;

    let start = h.manager.start_session(id, host.clone()).await.unwrap();
    assert_eq!(start.hands.len(), 2);
    assert_eq!(start.hands[0].0, host);
    assert_eq!(start.hands[0].1.score, 9);
    assert_eq!(start.hands[1].0, bob);
    assert_eq!(start.hands[1].1.score, 5);

    let snapshot = h.manager.snapshot(id).await.unwrap();
    assert_eq!(snapshot.state, Lifecycle::InProgress);
    assert_eq!(snapshot.current_turn, Some(host.clone()));

    // 9 + KING = 19, still under the target.
    let deck = start.deck_token.clone();
    let result = h.manager.hit(id, host.clone(), deck.clone()).await.unwrap();
    assert_eq!(result.outcome, Outcome::Continue);
    assert_eq!(result.new_score, 19);
    assert!(result.next_turn.is_none());

    // 19 + 5 = 24: bust, and with two members the turn must go to bob.
    let result = h.manager.hit(id, host.clone(), deck).await.unwrap();
    assert_eq!(result.outcome, Outcome::Loser);
    assert_eq!(result.new_score, 24);
    assert_eq!(result.next_turn, Some(bob.clone()));

    let snapshot = h.manager.snapshot(id).await.unwrap();
    assert_eq!(snapshot.state, Lifecycle::InProgress);
    assert_eq!(snapshot.current_turn, Some(bob));
}

#[tokio::test]
async fn join_after_start_is_rejected() {
    let h = harness();
    let id = h.manager.create_session("host".into()).await.unwrap();
    h.manager.join_session(id, "bob".into()).await.unwrap();
    h.manager.start_session(id, "host".into()).await.unwrap();

    let err = h.manager.join_session(id, "carol".into()).await.unwrap_err();
    assert!(matches!(err, GameError::InvalidState(Lifecycle::InProgress)));
}

#[tokio::test]
async fn winning_hit_concludes_and_frees_the_members() {
    let h = harness();
    let host = PlayerId::from("host");
    let bob = PlayerId::from("bob");
    let id = h.manager.create_session(host.clone()).await.unwrap();
    h.manager.join_session(id, bob.clone()).await.unwrap();

    h.deck_service
        .stack_next_deck(cards(&["10", "9", "2", "3", "2"]))
        .await;
    let start = h.manager.start_session(id, host.clone()).await.unwrap();

    let result = h
        .manager
        .hit(id, host.clone(), start.deck_token.clone())
        .await
        .unwrap();
    assert_eq!(result.outcome, Outcome::Winner);
    assert_eq!(result.new_score, 21);

    let snapshot = h.manager.snapshot(id).await.unwrap();
    assert_eq!(snapshot.state, Lifecycle::Concluded);

    // Late actions answer with the terminal state instead of mutating.
    let err = h
        .manager
        .hit(id, host.clone(), start.deck_token)
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::InvalidState(Lifecycle::Concluded)));
    let err = h.manager.stand(id, bob.clone()).await.unwrap_err();
    assert!(matches!(err, GameError::InvalidState(Lifecycle::Concluded)));

    // Conclusion released both members for new sessions.
    h.manager.create_session(host).await.unwrap();
    h.manager.create_session(bob).await.unwrap();

    // The stored record reflects the terminal state.
    let record = h.games.get_game(id).await.unwrap();
    assert_eq!(record.state, Lifecycle::Concluded);
}

#[tokio::test]
async fn stand_rotates_through_members_in_join_order() {
    let h = harness();
    let host = PlayerId::from("host");
    let id = h.manager.create_session(host.clone()).await.unwrap();
    h.manager.join_session(id, "a".into()).await.unwrap();
    h.manager.join_session(id, "b".into()).await.unwrap();
    h.manager.start_session(id, host.clone()).await.unwrap();

    let result = h.manager.stand(id, host.clone()).await.unwrap();
    assert_eq!(result.next_turn, Some(PlayerId::from("a")));
    // The wrap skips the standing host and lands on "b".
    let result = h.manager.stand(id, "a".into()).await.unwrap();
    assert_eq!(result.next_turn, Some(PlayerId::from("b")));
    // The last stand leaves nobody able to act, so the session concludes.
    let result = h.manager.stand(id, "b".into()).await.unwrap();
    assert_eq!(result.next_turn, None);

    let snapshot = h.manager.snapshot(id).await.unwrap();
    assert_eq!(snapshot.state, Lifecycle::Concluded);
    assert_eq!(snapshot.current_turn, None);

    // A locked score can never be acted on again.
    let err = h.manager.stand(id, host.clone()).await.unwrap_err();
    assert!(matches!(err, GameError::InvalidState(Lifecycle::Concluded)));

    // Conclusion by stand releases the members like any other conclusion.
    h.manager.create_session(host).await.unwrap();
}

#[tokio::test]
async fn concurrent_hits_are_serialized_without_lost_updates() {
    let h = harness();
    let host = PlayerId::from("host");
    let id = h.manager.create_session(host.clone()).await.unwrap();
    h.manager.join_session(id, "bob".into()).await.unwrap();

    // Low cards so both hits stay under the target and the host keeps the
    // turn for the second one regardless of arrival order.
    h.deck_service
        .stack_next_deck(cards(&["2", "3", "2", "3", "2", "3"]))
        .await;
    let start = h.manager.start_session(id, host.clone()).await.unwrap();
    let deck = start.deck_token;

    let (first, second) = tokio::join!(
        h.manager.hit(id, host.clone(), deck.clone()),
        h.manager.hit(id, host.clone(), deck),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    // 5 + 2 + 3 in some order; each hit saw the previous one applied.
    let scores = {
        let mut s = [first.new_score, second.new_score];
        s.sort_unstable();
        s
    };
    assert_eq!(scores, [7, 10]);

    let snapshot = h.manager.snapshot(id).await.unwrap();
    assert_eq!(snapshot.scores[&host], 10);
}

#[tokio::test]
async fn initial_deal_notifications_carry_only_the_recipients_hand() {
    let h = harness();
    let host = PlayerId::from("host");
    let bob = PlayerId::from("bob");
    let id = h.manager.create_session(host.clone()).await.unwrap();
    h.manager.join_session(id, bob.clone()).await.unwrap();

    let (host_tx, mut host_rx) = mpsc::channel(NOTIFY_CHANNEL_CAPACITY);
    let (bob_tx, mut bob_rx) = mpsc::channel(NOTIFY_CHANNEL_CAPACITY);
    h.registry.register(host.clone(), host_tx).await;
    h.registry.register(bob.clone(), bob_tx).await;

    h.deck_service
        .stack_next_deck(cards(&["4", "5", "2", "3"]))
        .await;
    let start = h.manager.start_session(id, host.clone()).await.unwrap();

    let Some(Notification::GameStarted { cards }) = host_rx.recv().await else {
        panic!("expected gameStarted for the host");
    };
    assert_eq!(cards, start.hands[0].1.cards);

    let Some(Notification::GameStarted { cards }) = bob_rx.recv().await else {
        panic!("expected gameStarted for bob");
    };
    assert_eq!(cards, start.hands[1].1.cards);

    // Both then hear that the host holds the first turn.
    assert_eq!(
        host_rx.recv().await,
        Some(Notification::PlayerTurn {
            player_id: host.clone()
        })
    );
    assert_eq!(
        bob_rx.recv().await,
        Some(Notification::PlayerTurn { player_id: host })
    );
}

#[tokio::test]
async fn out_of_turn_and_wrong_deck_are_rejected() {
    let h = harness();
    let host = PlayerId::from("host");
    let bob = PlayerId::from("bob");
    let id = h.manager.create_session(host.clone()).await.unwrap();
    h.manager.join_session(id, bob.clone()).await.unwrap();
    let start = h.manager.start_session(id, host.clone()).await.unwrap();

    let err = h
        .manager
        .hit(id, bob, start.deck_token.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::OutOfTurn));

    let err = h
        .manager
        .hit(id, host, "some-other-deck".into())
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::DeckMismatch));
}

#[tokio::test]
async fn failed_draw_leaves_the_session_untouched() {
    let h = harness();
    let host = PlayerId::from("host");
    let id = h.manager.create_session(host.clone()).await.unwrap();
    h.manager.join_session(id, "bob".into()).await.unwrap();

    // Exactly enough for the initial deal; the first hit finds the deck
    // empty.
    h.deck_service
        .stack_next_deck(cards(&["4", "5", "2", "3"]))
        .await;
    let start = h.manager.start_session(id, host.clone()).await.unwrap();
    let before = h.manager.snapshot(id).await.unwrap();

    let err = h
        .manager
        .hit(id, host.clone(), start.deck_token)
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::UpstreamDraw(_)));

    let after = h.manager.snapshot(id).await.unwrap();
    assert_eq!(after.state, before.state);
    assert_eq!(after.current_turn, before.current_turn);
    assert_eq!(after.scores, before.scores);
}

#[tokio::test]
async fn unknown_session_operations_fail_cleanly() {
    let h = harness();
    let id = uuid::Uuid::new_v4();
    let err = h.manager.snapshot(id).await.unwrap_err();
    assert!(matches!(err, GameError::SessionNotFound));
    let err = h.manager.start_session(id, "host".into()).await.unwrap_err();
    assert!(matches!(err, GameError::SessionNotFound));
}
