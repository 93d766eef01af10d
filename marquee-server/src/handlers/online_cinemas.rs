use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use marquee_core::{infra::cache::CachedOperation, query::Page};
use marquee_model::OnlineCinema;
use serde::Deserialize;

use super::{ListQuery, paged};
use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn list_online_cinemas(
    State(state): State<AppState>,
    query: ListQuery,
) -> AppResult<Json<Page<OnlineCinema>>> {
    let platforms = &state.unit_of_work.online_cinemas;
    let page = state
        .cache
        .get_or_fetch(CachedOperation::OnlineCinemas, &query.params, || {
            paged(query.page, platforms.count(), |window| platforms.list(window))
        })
        .await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
pub struct CreateOnlineCinema {
    pub name: String,
    pub url: String,
}

pub async fn create_online_cinema(
    State(state): State<AppState>,
    payload: Result<Json<CreateOnlineCinema>, JsonRejection>,
) -> AppResult<(StatusCode, Json<OnlineCinema>)> {
    let Json(body) = payload?;
    let platform = state
        .catalog
        .create_online_cinema(&body.name, &body.url)
        .await?;
    Ok((StatusCode::CREATED, Json(platform)))
}
