//! In-process draw service.
//!
//! Holds full 52-card decks in memory, shuffled with [`rand`]. Used when no
//! upstream draw API is configured and by tests, which can stack a
//! deterministic deck to script exact deals.

use std::collections::{HashMap, VecDeque};

use rand::seq::SliceRandom;
use tokio::sync::Mutex;
use uuid::Uuid;

use async_trait::async_trait;

use super::{DeckError, DeckResult, DeckService};
use crate::game::entities::{DeckToken, DrawnCard};

const FACES: [&str; 13] = [
    "ACE", "2", "3", "4", "5", "6", "7", "8", "9", "10", "JACK", "QUEEN", "KING",
];
const SUITS: [&str; 4] = ["SPADES", "HEARTS", "DIAMONDS", "CLUBS"];

#[derive(Default)]
struct LocalDecks {
    decks: HashMap<DeckToken, VecDeque<DrawnCard>>,
    /// Pre-built decks handed out by the next `new_shuffled_deck` calls,
    /// oldest first. Test hook for deterministic deals.
    stacked: VecDeque<Vec<DrawnCard>>,
}

/// In-memory [`DeckService`] implementation.
#[derive(Default)]
pub struct LocalDeckService {
    inner: Mutex<LocalDecks>,
}

impl LocalDeckService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a fixed card sequence to be returned, in order, by the next
    /// created deck instead of a shuffled one.
    pub async fn stack_next_deck(&self, cards: Vec<DrawnCard>) {
        let mut inner = self.inner.lock().await;
        inner.stacked.push_back(cards);
    }

    fn shuffled_deck() -> Vec<DrawnCard> {
        let mut cards = Vec::with_capacity(52);
        for suit in SUITS {
            for face in FACES {
                // Same art scheme the hosted deck API uses: face initial
                // (0 for 10) plus suit initial.
                let code = match face {
                    "10" => format!("0{}", &suit[..1]),
                    other => format!("{}{}", &other[..1], &suit[..1]),
                };
                cards.push(DrawnCard::new(
                    face,
                    format!("https://deckofcardsapi.com/static/img/{code}.png"),
                ));
            }
        }
        cards.shuffle(&mut rand::rng());
        cards
    }
}

#[async_trait]
impl DeckService for LocalDeckService {
    async fn new_shuffled_deck(&self) -> DeckResult<DeckToken> {
        let mut inner = self.inner.lock().await;
        let cards = inner
            .stacked
            .pop_front()
            .unwrap_or_else(Self::shuffled_deck);
        let token = DeckToken::from(Uuid::new_v4().to_string());
        inner.decks.insert(token.clone(), cards.into());
        Ok(token)
    }

    async fn draw_cards(&self, deck: &DeckToken, count: usize) -> DeckResult<Vec<DrawnCard>> {
        let mut inner = self.inner.lock().await;
        let cards = inner
            .decks
            .get_mut(deck)
            .ok_or_else(|| DeckError::Exhausted(deck.clone()))?;
        if cards.len() < count {
            return Err(DeckError::Exhausted(deck.clone()));
        }
        Ok(cards.drain(..count).collect())
    }
}
