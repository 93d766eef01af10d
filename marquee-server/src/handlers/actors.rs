use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::NaiveDate;
use marquee_core::{CatalogError, infra::cache::CachedOperation, query::Page};
use marquee_model::{Actor, ActorID};
use serde::Deserialize;

use super::{ListQuery, paged};
use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn list_actors(
    State(state): State<AppState>,
    query: ListQuery,
) -> AppResult<Json<Page<Actor>>> {
    let actors = &state.unit_of_work.actors;
    let page = state
        .cache
        .get_or_fetch(CachedOperation::Actors, &query.params, || {
            paged(query.page, actors.count(), |window| actors.list(window))
        })
        .await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
pub struct CreateActor {
    pub name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub biography: String,
}

pub async fn create_actor(
    State(state): State<AppState>,
    payload: Result<Json<CreateActor>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Actor>)> {
    let Json(body) = payload?;
    let actor = state
        .catalog
        .create_actor(&body.name, body.date_of_birth, body.biography)
        .await?;
    Ok((StatusCode::CREATED, Json(actor)))
}

pub async fn get_actor(
    State(state): State<AppState>,
    Path(id): Path<ActorID>,
) -> AppResult<Json<Actor>> {
    let actor = state
        .unit_of_work
        .actors
        .get(id)
        .await?
        .ok_or_else(|| CatalogError::not_found("actor", id))?;
    Ok(Json(actor))
}
