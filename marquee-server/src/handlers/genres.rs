use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use marquee_core::{infra::cache::CachedOperation, query::Page};
use marquee_model::Genre;
use serde::Deserialize;

use super::{ListQuery, paged};
use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn list_genres(
    State(state): State<AppState>,
    query: ListQuery,
) -> AppResult<Json<Page<Genre>>> {
    let genres = &state.unit_of_work.genres;
    let page = state
        .cache
        .get_or_fetch(CachedOperation::Genres, &query.params, || {
            paged(query.page, genres.count(), |window| genres.list(window))
        })
        .await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
pub struct CreateGenre {
    pub name: String,
}

pub async fn create_genre(
    State(state): State<AppState>,
    payload: Result<Json<CreateGenre>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Genre>)> {
    let Json(body) = payload?;
    let genre = state.catalog.create_genre(&body.name).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}
