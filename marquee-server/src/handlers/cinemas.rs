use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use marquee_core::{CatalogError, infra::cache::CachedOperation, query::Page};
use marquee_model::{Cinema, CinemaID};
use serde::Deserialize;

use super::{ListQuery, paged};
use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn list_cinemas(
    State(state): State<AppState>,
    query: ListQuery,
) -> AppResult<Json<Page<Cinema>>> {
    let cinemas = &state.unit_of_work.cinemas;
    let page = state
        .cache
        .get_or_fetch(CachedOperation::Cinemas, &query.params, || {
            paged(query.page, cinemas.count(), |window| cinemas.list(window))
        })
        .await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
pub struct CinemaPayload {
    pub name: String,
    pub address: String,
}

pub async fn create_cinema(
    State(state): State<AppState>,
    payload: Result<Json<CinemaPayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Cinema>)> {
    let Json(body) = payload?;
    let cinema = state.catalog.create_cinema(&body.name, &body.address).await?;
    Ok((StatusCode::CREATED, Json(cinema)))
}

pub async fn get_cinema(
    State(state): State<AppState>,
    Path(id): Path<CinemaID>,
) -> AppResult<Json<Cinema>> {
    let cinema = state
        .unit_of_work
        .cinemas
        .get(id)
        .await?
        .ok_or_else(|| CatalogError::not_found("cinema", id))?;
    Ok(Json(cinema))
}

pub async fn update_cinema(
    State(state): State<AppState>,
    Path(id): Path<CinemaID>,
    payload: Result<Json<CinemaPayload>, JsonRejection>,
) -> AppResult<Json<Cinema>> {
    let Json(body) = payload?;
    let cinema = state
        .catalog
        .update_cinema(id, &body.name, &body.address)
        .await?;
    Ok(Json(cinema))
}

/// Also drops the cinema's showtimes.
pub async fn delete_cinema(
    State(state): State<AppState>,
    Path(id): Path<CinemaID>,
) -> AppResult<StatusCode> {
    state.unit_of_work.cinemas.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
