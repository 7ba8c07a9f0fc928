use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User, UserChanges};
use crate::store::StoreResult;

/// Account persistence. Email uniqueness is the store's job.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new: NewUser) -> StoreResult<User>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    /// `None` when no account has this id.
    async fn update(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new: NewUser) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, name, about, avatar)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, password_hash, name, about, avatar, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.name)
        .bind(&new.about)
        .bind(&new.avatar)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, about, avatar, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, about, avatar, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>> {
        let query = match changes {
            UserChanges::Profile { name, about } => sqlx::query_as::<_, User>(
                r#"
                UPDATE users SET name = $2, about = $3
                WHERE id = $1
                RETURNING id, email, password_hash, name, about, avatar, created_at
                "#,
            )
            .bind(id)
            .bind(name)
            .bind(about),
            UserChanges::Avatar(avatar) => sqlx::query_as::<_, User>(
                r#"
                UPDATE users SET avatar = $2
                WHERE id = $1
                RETURNING id, email, password_hash, name, about, avatar, created_at
                "#,
            )
            .bind(id)
            .bind(avatar),
        };
        Ok(query.fetch_optional(&self.db).await?)
    }
}
