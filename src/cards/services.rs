use std::{sync::Arc, time::Duration};

use axum::extract::FromRef;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::CardView,
    repo::CardStore,
    repo_types::{Card, LikeOp, NewCard},
};
use crate::{
    error::AppError,
    state::AppState,
    store::bounded,
    validation::{check_text, check_url},
};

/// Ownership and like rules for cards.
///
/// Every method takes the acting account id from the verified token, never
/// from anything the client sent. Each operation touches exactly one card
/// and leaves ordering of concurrent writes to the store.
#[derive(Clone)]
pub struct CardEngine {
    store: Arc<dyn CardStore>,
    timeout: Duration,
}

impl FromRef<AppState> for CardEngine {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.cards.clone(), state.store_timeout())
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Card not found".into())
}

impl CardEngine {
    pub fn new(store: Arc<dyn CardStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn create(&self, name: String, link: String, owner: Uuid) -> Result<Card, AppError> {
        check_text("name", &name)?;
        check_url("link", &link)?;
        let card = bounded(self.timeout, self.store.create(NewCard { name, link, owner })).await?;
        info!(card_id = %card.id, owner = %owner, "card created");
        Ok(card)
    }

    /// All cards, newest first, each marked for `viewer`.
    pub async fn list(&self, viewer: Uuid) -> Result<Vec<CardView>, AppError> {
        let cards = bounded(self.timeout, self.store.find_all()).await?;
        Ok(cards
            .into_iter()
            .map(|card| CardView::for_viewer(card, viewer))
            .collect())
    }

    /// Idempotent: liking twice leaves one entry.
    pub async fn like(&self, card_id: Uuid, user_id: Uuid) -> Result<Card, AppError> {
        self.apply(card_id, LikeOp::Add(user_id)).await
    }

    /// Idempotent: removing an absent like succeeds without change.
    pub async fn unlike(&self, card_id: Uuid, user_id: Uuid) -> Result<Card, AppError> {
        self.apply(card_id, LikeOp::Remove(user_id)).await
    }

    async fn apply(&self, card_id: Uuid, op: LikeOp) -> Result<Card, AppError> {
        bounded(self.timeout, self.store.update_likes(card_id, op))
            .await?
            .ok_or_else(not_found)
    }

    /// Owner-only delete. The ownership check runs before anything is
    /// written; a non-owner leaves the card untouched.
    pub async fn delete(&self, card_id: Uuid, requester: Uuid) -> Result<(), AppError> {
        let card = bounded(self.timeout, self.store.find_by_id(card_id))
            .await?
            .ok_or_else(not_found)?;

        if card.owner != requester {
            warn!(card_id = %card_id, requester = %requester, "delete by non-owner refused");
            return Err(AppError::Forbidden(
                "You can only delete your own cards".into(),
            ));
        }

        // a concurrent delete by the owner may have won the race
        if !bounded(self.timeout, self.store.delete(card_id)).await? {
            return Err(not_found());
        }
        info!(card_id = %card_id, "card deleted");
        Ok(())
    }
}
