use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Card record in the database.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Card {
    pub id: Uuid,
    pub name: String,
    pub link: String,
    #[sqlx(rename = "owner_id")]
    pub owner: Uuid, // fixed at creation
    pub likes: Vec<Uuid>, // set semantics: never holds the same id twice
    pub created_at: OffsetDateTime,
}

impl Card {
    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.likes.contains(&user_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewCard {
    pub name: String,
    pub link: String,
    pub owner: Uuid,
}

/// Field-level mutation of the liker set, applied atomically by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOp {
    Add(Uuid),
    Remove(Uuid),
}
