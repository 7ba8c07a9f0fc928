use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_NAME: &str = "Jacques Cousteau";
pub const DEFAULT_ABOUT: &str = "Explorer";
pub const DEFAULT_AVATAR: &str =
    "https://practicum-content.s3.us-west-1.amazonaws.com/resources/moved_avatar_1604080799.jpg";

/// Account record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String, // Argon2 PHC string
    pub name: String,
    pub about: String,
    pub avatar: String,
    pub created_at: OffsetDateTime,
}

/// Fields for a new account; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub about: String,
    pub avatar: String,
}

#[derive(Debug, Clone)]
pub enum UserChanges {
    Profile { name: String, about: String },
    Avatar(String),
}
