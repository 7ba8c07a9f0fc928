use axum::{
    extract::State,
    routing::{get, patch},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{UpdateAvatarRequest, UpdateProfileRequest},
    services,
};
use crate::{
    auth::{dto::PublicUser, AuthUser},
    error::AppError,
    state::AppState,
    validation::ValidJson,
};

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_me).patch(update_me))
        .route("/users/me/avatar", patch(update_avatar))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let account = services::current_user(&state, user.id).await?;
    Ok(Json(account.into()))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(payload): ValidJson<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let account = services::update_profile(&state, user.id, payload.name, payload.about).await?;
    Ok(Json(account.into()))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_avatar(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(payload): ValidJson<UpdateAvatarRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let account = services::update_avatar(&state, user.id, payload.avatar).await?;
    Ok(Json(account.into()))
}
