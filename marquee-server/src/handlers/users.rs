use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use marquee_core::query::Page;
use marquee_model::{Favorite, User, UserID};
use serde::Deserialize;

use super::{ListQuery, paged};
use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn list_users(
    State(state): State<AppState>,
    query: ListQuery,
) -> AppResult<Json<Page<User>>> {
    let users = &state.unit_of_work.users;
    let page = paged(query.page, users.count(), |window| users.list(window)).await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> AppResult<(StatusCode, Json<User>)> {
    let Json(body) = payload?;
    let user = state.catalog.create_user(&body.username, body.email).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Most recently favorited first.
pub async fn list_favorites(
    State(state): State<AppState>,
    Path(id): Path<UserID>,
    query: ListQuery,
) -> AppResult<Json<Page<Favorite>>> {
    state.catalog.require_user(id).await?;
    let favorites = &state.unit_of_work.favorites;
    let page = paged(query.page, favorites.count_for_user(id), |window| {
        favorites.list_for_user(id, window)
    })
    .await?;
    Ok(Json(page))
}
