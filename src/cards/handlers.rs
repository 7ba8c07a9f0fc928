use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CardView, CreateCardRequest, DeleteCardResponse},
    services::CardEngine,
};
use crate::{
    auth::AuthUser,
    error::AppError,
    state::AppState,
    validation::{parse_id, ValidJson},
};

pub fn card_routes() -> Router<AppState> {
    Router::new()
        .route("/cards", get(list_cards).post(create_card))
        .route("/cards/:card_id", delete(delete_card))
        .route("/cards/:card_id/likes", put(like_card).delete(unlike_card))
}

#[instrument(skip(engine, user), fields(user_id = %user.id))]
pub async fn list_cards(
    State(engine): State<CardEngine>,
    user: AuthUser,
) -> Result<Json<Vec<CardView>>, AppError> {
    Ok(Json(engine.list(user.id).await?))
}

#[instrument(skip(engine, user, payload), fields(user_id = %user.id))]
pub async fn create_card(
    State(engine): State<CardEngine>,
    user: AuthUser,
    ValidJson(payload): ValidJson<CreateCardRequest>,
) -> Result<(StatusCode, Json<CardView>), AppError> {
    let card = engine.create(payload.name, payload.link, user.id).await?;
    Ok((StatusCode::CREATED, Json(CardView::for_viewer(card, user.id))))
}

#[instrument(skip(engine, user), fields(user_id = %user.id))]
pub async fn delete_card(
    State(engine): State<CardEngine>,
    user: AuthUser,
    Path(card_id): Path<String>,
) -> Result<Json<DeleteCardResponse>, AppError> {
    let card_id = parse_id("card", &card_id)?;
    engine.delete(card_id, user.id).await?;
    Ok(Json(DeleteCardResponse::removed()))
}

#[instrument(skip(engine, user), fields(user_id = %user.id))]
pub async fn like_card(
    State(engine): State<CardEngine>,
    user: AuthUser,
    Path(card_id): Path<String>,
) -> Result<Json<CardView>, AppError> {
    let card_id = parse_id("card", &card_id)?;
    let card = engine.like(card_id, user.id).await?;
    Ok(Json(CardView::for_viewer(card, user.id)))
}

#[instrument(skip(engine, user), fields(user_id = %user.id))]
pub async fn unlike_card(
    State(engine): State<CardEngine>,
    user: AuthUser,
    Path(card_id): Path<String>,
) -> Result<Json<CardView>, AppError> {
    let card_id = parse_id("card", &card_id)?;
    let card = engine.unlike(card_id, user.id).await?;
    Ok(Json(CardView::for_viewer(card, user.id)))
}
