//! Session state and the turn state machine.
//!
//! A [`GameSession`] moves through `Forming -> InProgress -> Concluded` with
//! no reverse transitions. Membership is only mutable while forming; once
//! play begins the member list is frozen, the deck token is pinned, and the
//! turn holder advances according to hit/stand outcomes.
//!
//! This module is purely synchronous. Serialization of concurrent mutations
//! is the session actor's job (see [`crate::session`]); randomness for the
//! bust handoff is injected so outcomes stay testable.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

use super::entities::{DeckToken, DrawnCard, Hand, Outcome, PlayerId, SessionId, TARGET_SCORE};
use super::errors::{GameError, GameResult};
use crate::deck::DeckError;

/// Lifecycle state of a session. `Concluded` is terminal.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Lifecycle {
    /// Accepting joins; play has not begun.
    Forming,
    /// Turn-by-turn play.
    InProgress,
    /// A terminal outcome was reached; no further mutation is permitted.
    Concluded,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Forming => "forming",
            Self::InProgress => "in progress",
            Self::Concluded => "concluded",
        };
        write!(f, "{repr}")
    }
}

/// Result of a resolved hit.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HitResult {
    pub outcome: Outcome,
    pub new_score: u32,
    pub new_card: DrawnCard,
    /// Present only when the turn moved to another player.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_turn: Option<PlayerId>,
}

/// One game instance: host, ordered membership, per-player hands, and the
/// current turn holder.
#[derive(Clone, Debug)]
pub struct GameSession {
    id: SessionId,
    host: PlayerId,
    /// Insertion order is join order; the host is always first.
    members: Vec<PlayerId>,
    state: Lifecycle,
    current_turn: Option<PlayerId>,
    deck: Option<DeckToken>,
    hands: HashMap<PlayerId, Hand>,
}

impl GameSession {
    /// Create a forming session whose only member is the host.
    #[must_use]
    pub fn new(id: SessionId, host: PlayerId) -> Self {
        Self {
            id,
            members: vec![host.clone()],
            host,
            state: Lifecycle::Forming,
            current_turn: None,
            deck: None,
            hands: HashMap::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn host(&self) -> &PlayerId {
        &self.host
    }

    #[must_use]
    pub fn members(&self) -> &[PlayerId] {
        &self.members
    }

    #[must_use]
    pub fn state(&self) -> Lifecycle {
        self.state
    }

    #[must_use]
    pub fn current_turn(&self) -> Option<&PlayerId> {
        self.current_turn.as_ref()
    }

    #[must_use]
    pub fn deck(&self) -> Option<&DeckToken> {
        self.deck.as_ref()
    }

    #[must_use]
    pub fn hand(&self, player: &PlayerId) -> Option<&Hand> {
        self.hands.get(player)
    }

    #[must_use]
    pub fn is_concluded(&self) -> bool {
        self.state == Lifecycle::Concluded
    }

    /// Per-player scores, empty until play begins.
    #[must_use]
    pub fn scores(&self) -> HashMap<PlayerId, u32> {
        self.hands
            .iter()
            .map(|(player, hand)| (player.clone(), hand.score))
            .collect()
    }

    /// Append a player to the member list. Permitted only while forming.
    /// Returns the host identity so the caller can target its notification.
    pub fn add_member(&mut self, player: PlayerId) -> GameResult<PlayerId> {
        if self.state != Lifecycle::Forming {
            return Err(GameError::InvalidState(self.state));
        }
        if self.members.contains(&player) {
            return Err(GameError::PlayerBusy(player));
        }
        self.members.push(player);
        Ok(self.host.clone())
    }

    /// Check the preconditions for starting play without mutating anything.
    /// Used by the action processor before it spends a draw-service call.
    pub fn ensure_can_start(&self, caller: &PlayerId) -> GameResult<()> {
        if self.state != Lifecycle::Forming {
            return Err(GameError::InvalidState(self.state));
        }
        if caller != &self.host {
            return Err(GameError::NotHost);
        }
        if self.members.len() < 2 {
            return Err(GameError::NotEnoughPlayers);
        }
        Ok(())
    }

    /// Transition `Forming -> InProgress`: pin the deck, deal two of the
    /// supplied cards to every member in join order, and hand the first turn
    /// to the host. Returns the dealt hands in member order for broadcast.
    pub fn begin(
        &mut self,
        caller: &PlayerId,
        deck: DeckToken,
        cards: Vec<DrawnCard>,
    ) -> GameResult<Vec<(PlayerId, Hand)>> {
        self.ensure_can_start(caller)?;
        if cards.len() != 2 * self.members.len() {
            return Err(GameError::UpstreamDraw(DeckError::Malformed(format!(
                "expected {} cards, got {}",
                2 * self.members.len(),
                cards.len()
            ))));
        }

        let mut dealt = Vec::with_capacity(self.members.len());
        let mut cards = cards.into_iter();
        for member in &self.members {
            let mut hand = Hand::default();
            // The iterator length was checked above.
            for card in cards.by_ref().take(2) {
                let points = card_points(&card)?;
                hand.push(card, points);
            }
            dealt.push((member.clone(), hand));
        }

        self.hands = dealt.iter().cloned().collect();
        self.deck = Some(deck);
        self.current_turn = Some(self.host.clone());
        self.state = Lifecycle::InProgress;
        Ok(dealt)
    }

    /// Check the preconditions for a hit without mutating anything: the
    /// session is in progress, the acting player holds the turn, and the
    /// supplied deck token is the session's own.
    pub fn ensure_can_hit(&self, player: &PlayerId, deck: &DeckToken) -> GameResult<()> {
        self.ensure_turn(player)?;
        if self.deck.as_ref() != Some(deck) {
            return Err(GameError::DeckMismatch);
        }
        Ok(())
    }

    /// Apply a drawn card to the acting player's hand and resolve the turn
    /// transition against the target score.
    pub fn apply_hit<R: Rng>(
        &mut self,
        player: &PlayerId,
        deck: &DeckToken,
        card: DrawnCard,
        rng: &mut R,
    ) -> GameResult<HitResult> {
        self.ensure_can_hit(player, deck)?;
        let points = card_points(&card)?;

        // All validation has passed; from here the mutation must complete.
        let hand = self.hands.entry(player.clone()).or_default();
        hand.push(card.clone(), points);
        let new_score = hand.score;

        let (outcome, next_turn) = if new_score < TARGET_SCORE {
            (Outcome::Continue, None)
        } else if new_score == TARGET_SCORE {
            self.state = Lifecycle::Concluded;
            (Outcome::Winner, None)
        } else {
            // Bust: hand the turn to a different member, chosen uniformly at
            // random from everyone who has not yet locked in a score. With
            // no one left to act the round is over.
            let candidates: Vec<&PlayerId> = self
                .members
                .iter()
                .filter(|m| *m != player && !self.is_standing(m))
                .collect();
            if candidates.is_empty() {
                self.current_turn = None;
                self.state = Lifecycle::Concluded;
                (Outcome::Loser, None)
            } else {
                let next = candidates[rng.random_range(0..candidates.len())].clone();
                self.current_turn = Some(next.clone());
                (Outcome::Loser, Some(next))
            }
        };

        Ok(HitResult {
            outcome,
            new_score,
            new_card: card,
            next_turn,
        })
    }

    /// Lock in the acting player's score as final and pass the turn to the
    /// next member in join order, wrapping around. Members who already stood
    /// are skipped so a locked score can never be acted on again; once every
    /// member has stood the session concludes and `None` is returned.
    pub fn apply_stand(&mut self, player: &PlayerId) -> GameResult<Option<PlayerId>> {
        self.ensure_turn(player)?;

        if let Some(hand) = self.hands.get_mut(player) {
            hand.standing = true;
        }

        // `current_turn` is always an element of `members` while in progress.
        let position = self
            .members
            .iter()
            .position(|m| m == player)
            .unwrap_or_default();
        let next = (1..self.members.len())
            .map(|offset| &self.members[(position + offset) % self.members.len()])
            .find(|m| !self.is_standing(m))
            .cloned();
        match &next {
            Some(member) => self.current_turn = Some(member.clone()),
            None => {
                self.current_turn = None;
                self.state = Lifecycle::Concluded;
            }
        }
        Ok(next)
    }

    fn is_standing(&self, player: &PlayerId) -> bool {
        self.hands.get(player).is_some_and(|hand| hand.standing)
    }

    fn ensure_turn(&self, player: &PlayerId) -> GameResult<()> {
        if self.state != Lifecycle::InProgress {
            return Err(GameError::InvalidState(self.state));
        }
        if self.current_turn.as_ref() != Some(player) {
            return Err(GameError::OutOfTurn);
        }
        Ok(())
    }
}

fn card_points(card: &DrawnCard) -> GameResult<u32> {
    card.points().ok_or_else(|| {
        GameError::UpstreamDraw(DeckError::Malformed(format!(
            "unrecognized face value {:?}",
            card.value
        )))
    })
}
