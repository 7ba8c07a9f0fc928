use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Card, LikeOp, NewCard};
use crate::store::StoreResult;

/// Card persistence. `update_likes` must be a single atomic write per card so
/// concurrent likers never overwrite each other.
#[async_trait]
pub trait CardStore: Send + Sync {
    async fn create(&self, new: NewCard) -> StoreResult<Card>;
    /// Newest first.
    async fn find_all(&self) -> StoreResult<Vec<Card>>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Card>>;
    /// `None` when the card does not exist.
    async fn update_likes(&self, id: Uuid, op: LikeOp) -> StoreResult<Option<Card>>;
    /// `false` when there was nothing to delete.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

#[derive(Clone)]
pub struct PgCardStore {
    db: PgPool,
}

impl PgCardStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CardStore for PgCardStore {
    async fn create(&self, new: NewCard) -> StoreResult<Card> {
        let card = sqlx::query_as::<_, Card>(
            r#"
            INSERT INTO cards (id, name, link, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, link, owner_id, likes, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.link)
        .bind(new.owner)
        .fetch_one(&self.db)
        .await?;
        Ok(card)
    }

    async fn find_all(&self) -> StoreResult<Vec<Card>> {
        let rows = sqlx::query_as::<_, Card>(
            r#"
            SELECT id, name, link, owner_id, likes, created_at
            FROM cards
            ORDER BY created_at DESC, id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Card>> {
        let card = sqlx::query_as::<_, Card>(
            r#"
            SELECT id, name, link, owner_id, likes, created_at
            FROM cards
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(card)
    }

    async fn update_likes(&self, id: Uuid, op: LikeOp) -> StoreResult<Option<Card>> {
        // One UPDATE per call: Postgres re-evaluates the SET expression against
        // the latest row version when two writers collide.
        let query = match op {
            LikeOp::Add(user_id) => sqlx::query_as::<_, Card>(
                r#"
                UPDATE cards
                SET likes = CASE WHEN $2 = ANY(likes) THEN likes ELSE array_append(likes, $2) END
                WHERE id = $1
                RETURNING id, name, link, owner_id, likes, created_at
                "#,
            )
            .bind(id)
            .bind(user_id),
            LikeOp::Remove(user_id) => sqlx::query_as::<_, Card>(
                r#"
                UPDATE cards
                SET likes = array_remove(likes, $2)
                WHERE id = $1
                RETURNING id, name, link, owner_id, likes, created_at
                "#,
            )
            .bind(id)
            .bind(user_id),
        };
        Ok(query.fetch_optional(&self.db).await?)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
