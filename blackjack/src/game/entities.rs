//! Game entities: identifiers, cards, hands, and round outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The score every player is racing toward. Exactly this wins the round,
/// anything above it busts.
pub const TARGET_SCORE: u32 = 21;

/// Unique identifier of a game session, assigned at creation.
pub type SessionId = Uuid;

/// Durable, client-chosen player identity.
///
/// Opaque to the coordinator: any string is acceptable and idempotently
/// registrable. This is the correlation key for the connection registry,
/// session membership, and scoring.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Opaque handle identifying a shuffled deck held by the draw service.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DeckToken(String);

impl DeckToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeckToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DeckToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DeckToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single card as returned by the draw service: a face value plus a
/// reference to the card art.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DrawnCard {
    /// Face value, e.g. `"ACE"`, `"7"`, `"KING"`.
    pub value: String,
    /// URL or other opaque reference to the card image.
    pub image: String,
}

impl DrawnCard {
    #[must_use]
    pub fn new(value: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            image: image.into(),
        }
    }

    /// Map the face value to its point contribution: face cards are 10, an
    /// ace is 1, numerals count their literal value. `None` for anything the
    /// draw service should not have produced.
    #[must_use]
    pub fn points(&self) -> Option<u32> {
        match self.value.as_str() {
            "ACE" => Some(1),
            "JACK" | "QUEEN" | "KING" => Some(10),
            numeral => match numeral.parse::<u32>() {
                Ok(n) if (2..=10).contains(&n) => Some(n),
                _ => None,
            },
        }
    }
}

/// One player's dealt cards and derived score.
///
/// Cards are only ever added, so the score is monotonically non-decreasing.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hand {
    pub cards: Vec<DrawnCard>,
    pub score: u32,
    /// Set once the player stands; the score is final from then on.
    pub standing: bool,
}

impl Hand {
    /// Add a card worth `points` to the hand.
    pub fn push(&mut self, card: DrawnCard, points: u32) {
        self.cards.push(card);
        self.score += points;
    }
}

/// How a hit resolved against the target score.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Below the target; the same player keeps the turn.
    Continue,
    /// Hit the target exactly; the session concludes.
    Winner,
    /// Bust; the turn passes to another member.
    Loser,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Continue => "continue",
            Self::Winner => "winner",
            Self::Loser => "loser",
        };
        write!(f, "{repr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_cards_are_worth_ten() {
        for face in ["JACK", "QUEEN", "KING"] {
            let card = DrawnCard::new(face, "img");
            assert_eq!(card.points(), Some(10));
        }
    }

    #[test]
    fn ace_is_worth_one() {
        assert_eq!(DrawnCard::new("ACE", "img").points(), Some(1));
    }

    #[test]
    fn numerals_are_literal() {
        for n in 2..=10 {
            let card = DrawnCard::new(n.to_string(), "img");
            assert_eq!(card.points(), Some(n));
        }
    }

    #[test]
    fn garbage_faces_are_rejected() {
        for junk in ["JOKER", "0", "1", "11", "", "ace"] {
            assert_eq!(DrawnCard::new(junk, "img").points(), None, "{junk}");
        }
    }

    #[test]
    fn hand_score_accumulates() {
        let mut hand = Hand::default();
        hand.push(DrawnCard::new("9", "img"), 9);
        hand.push(DrawnCard::new("KING", "img"), 10);
        assert_eq!(hand.score, 19);
        assert_eq!(hand.cards.len(), 2);
    }
}
