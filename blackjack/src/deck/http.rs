//! HTTP draw service client for a deckofcardsapi.com-style JSON API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{DeckError, DeckResult, DeckService};
use crate::game::entities::{DeckToken, DrawnCard};

/// Default bound on a single draw-service request.
pub const DEFAULT_DRAW_TIMEOUT: Duration = Duration::from_secs(5);

/// `GET {base}/api/deck/new/shuffle/` response.
#[derive(Debug, Deserialize)]
struct ShuffleResponse {
    success: bool,
    deck_id: String,
}

/// `GET {base}/api/deck/{id}/draw/` response.
#[derive(Debug, Deserialize)]
struct DrawResponse {
    success: bool,
    #[serde(default)]
    cards: Vec<ApiCard>,
}

#[derive(Debug, Deserialize)]
struct ApiCard {
    value: String,
    image: String,
}

impl From<ApiCard> for DrawnCard {
    fn from(card: ApiCard) -> Self {
        DrawnCard::new(card.value, card.image)
    }
}

/// [`DeckService`] backed by an upstream HTTP deck API.
pub struct HttpDeckService {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpDeckService {
    /// Build a client for `base_url` (e.g. `https://deckofcardsapi.com`)
    /// with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> DeckResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeckError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> DeckResult<T> {
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeckError::Timeout(self.timeout)
                } else {
                    DeckError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(DeckError::Transport(format!(
                "{} answered {}",
                url,
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DeckError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl DeckService for HttpDeckService {
    async fn new_shuffled_deck(&self) -> DeckResult<DeckToken> {
        let url = format!("{}/api/deck/new/shuffle/?deck_count=1", self.base_url);
        let body: ShuffleResponse = self.get_json(url).await?;
        if !body.success {
            return Err(DeckError::Transport(
                "deck service refused to shuffle a new deck".to_string(),
            ));
        }
        Ok(DeckToken::from(body.deck_id))
    }

    async fn draw_cards(&self, deck: &DeckToken, count: usize) -> DeckResult<Vec<DrawnCard>> {
        let url = format!(
            "{}/api/deck/{}/draw/?count={}",
            self.base_url, deck, count
        );
        let body: DrawResponse = self.get_json(url).await?;
        if !body.success || body.cards.len() != count {
            return Err(DeckError::Exhausted(deck.clone()));
        }
        Ok(body.cards.into_iter().map(DrawnCard::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shuffle_response_parses() {
        let json = r#"{"success": true, "deck_id": "3p40paa87x90", "shuffled": true, "remaining": 52}"#;
        let parsed: ShuffleResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.deck_id, "3p40paa87x90");
    }

    #[test]
    fn draw_response_parses_cards() {
        let json = r#"{
            "success": true,
            "deck_id": "3p40paa87x90",
            "cards": [
                {"code": "6H", "image": "https://deckofcardsapi.com/static/img/6H.png",
                 "value": "6", "suit": "HEARTS"},
                {"code": "KS", "image": "https://deckofcardsapi.com/static/img/KS.png",
                 "value": "KING", "suit": "SPADES"}
            ],
            "remaining": 50
        }"#;
        let parsed: DrawResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.success);
        let cards: Vec<DrawnCard> = parsed.cards.into_iter().map(DrawnCard::from).collect();
        assert_eq!(cards[0].points(), Some(6));
        assert_eq!(cards[1].points(), Some(10));
    }

    #[test]
    fn failed_draw_parses_without_cards() {
        let json = r#"{"success": false, "deck_id": "x", "remaining": 0, "error": "Not enough cards remaining to draw 2 additional"}"#;
        let parsed: DrawResponse = serde_json::from_str(json).unwrap();
        assert!(!parsed.success);
        assert!(parsed.cards.is_empty());
    }
}
