use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::Card;

#[derive(Debug, Deserialize)]
pub struct CreateCardRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub link: String,
}

/// A card as one particular viewer sees it. `is_liked` is computed per
/// request and never stored.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub id: Uuid,
    pub name: String,
    pub link: String,
    pub owner: Uuid,
    pub likes: Vec<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub is_liked: bool,
}

impl CardView {
    pub fn for_viewer(card: Card, viewer: Uuid) -> Self {
        let is_liked = card.is_liked_by(viewer);
        Self {
            id: card.id,
            name: card.name,
            link: card.link,
            owner: card.owner,
            likes: card.likes,
            created_at: card.created_at,
            is_liked,
        }
    }
}

/// `should_remove` tells a client holding an optimistic copy of the list
/// that the card is really gone.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCardResponse {
    pub success: bool,
    pub should_remove: bool,
    pub message: String,
}

impl DeleteCardResponse {
    pub fn removed() -> Self {
        Self {
            success: true,
            should_remove: true,
            message: "Card deleted".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_serializes_camel_case() {
        let viewer = Uuid::new_v4();
        let card = Card {
            id: Uuid::new_v4(),
            name: "Golden Gate".into(),
            link: "https://example.com/a.jpg".into(),
            owner: Uuid::new_v4(),
            likes: vec![viewer],
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_value(CardView::for_viewer(card, viewer)).unwrap();
        assert_eq!(json["isLiked"], true);
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["likes"].as_array().unwrap().len(), 1);

        let deleted = serde_json::to_value(DeleteCardResponse::removed()).unwrap();
        assert_eq!(deleted["shouldRemove"], true);
        assert_eq!(deleted["success"], true);
    }
}
