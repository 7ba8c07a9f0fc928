use tracing::info;
use uuid::Uuid;

use crate::{
    auth::repo_types::{User, UserChanges},
    error::AppError,
    state::AppState,
    store::bounded,
    validation::{check_text, check_url},
};

fn not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

pub async fn current_user(state: &AppState, user_id: Uuid) -> Result<User, AppError> {
    bounded(state.store_timeout(), state.users.find_by_id(user_id))
        .await?
        .ok_or_else(not_found)
}

/// Profile writes always target the caller's own account.
pub async fn update_profile(
    state: &AppState,
    user_id: Uuid,
    name: String,
    about: String,
) -> Result<User, AppError> {
    check_text("name", &name)?;
    check_text("about", &about)?;
    let user = bounded(
        state.store_timeout(),
        state.users.update(user_id, UserChanges::Profile { name, about }),
    )
    .await?
    .ok_or_else(not_found)?;
    info!(user_id = %user.id, "profile updated");
    Ok(user)
}

pub async fn update_avatar(state: &AppState, user_id: Uuid, avatar: String) -> Result<User, AppError> {
    check_url("avatar", &avatar)?;
    let user = bounded(
        state.store_timeout(),
        state.users.update(user_id, UserChanges::Avatar(avatar)),
    )
    .await?
    .ok_or_else(not_found)?;
    info!(user_id = %user.id, "avatar updated");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{dto::SignupRequest, services::register};

    async fn seeded() -> (AppState, User) {
        let state = AppState::fake();
        let user = register(
            &state,
            SignupRequest {
                email: "a@x.com".into(),
                password: "password1".into(),
                name: None,
                about: None,
                avatar: None,
            },
        )
        .await
        .unwrap();
        (state, user)
    }

    #[tokio::test]
    async fn current_user_found_and_missing() {
        let (state, user) = seeded().await;
        assert_eq!(current_user(&state, user.id).await.unwrap().email, "a@x.com");
        let err = current_user(&state, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn profile_update_validates_and_persists() {
        let (state, user) = seeded().await;
        let err = update_profile(&state, user.id, "X".into(), "Explorer".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let updated = update_profile(&state, user.id, "Sylvia Earle".into(), "Oceanographer".into())
            .await
            .unwrap();
        assert_eq!(updated.name, "Sylvia Earle");
        assert_eq!(current_user(&state, user.id).await.unwrap().about, "Oceanographer");
    }

    #[tokio::test]
    async fn avatar_update_requires_url() {
        let (state, user) = seeded().await;
        assert!(update_avatar(&state, user.id, "nope".into()).await.is_err());
        let updated = update_avatar(&state, user.id, "https://example.com/me.png".into())
            .await
            .unwrap();
        assert_eq!(updated.avatar, "https://example.com/me.png");
    }

    #[tokio::test]
    async fn updates_for_missing_account_are_not_found() {
        let state = AppState::fake();
        let err = update_avatar(&state, Uuid::new_v4(), "https://example.com/me.png".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
