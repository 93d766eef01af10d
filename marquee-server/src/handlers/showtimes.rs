use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use marquee_core::{
    CatalogError, database::ports::catalog::ShowtimeFilter,
    infra::cache::CachedOperation, query::Page,
};
use marquee_model::{CinemaID, MovieID, Showtime, ShowtimeID};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{ListQuery, paged};
use crate::infra::{app_state::AppState, errors::AppResult};

/// Optional `movie_id` / `cinema_id` filters, earliest start first.
pub async fn list_showtimes(
    State(state): State<AppState>,
    query: ListQuery,
) -> AppResult<Json<Page<Showtime>>> {
    let filter = ShowtimeFilter {
        movie_id: query.parse::<MovieID>("movie_id")?,
        cinema_id: query.parse::<CinemaID>("cinema_id")?,
    };
    let showtimes = &state.unit_of_work.showtimes;
    let page = state
        .cache
        .get_or_fetch(CachedOperation::Showtimes, &query.params, || {
            paged(query.page, showtimes.count(&filter), |window| {
                showtimes.list(&filter, window)
            })
        })
        .await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
pub struct CreateShowtime {
    pub movie_id: MovieID,
    pub cinema_id: CinemaID,
    pub start_time: DateTime<Utc>,
    pub ticket_price: Decimal,
}

pub async fn create_showtime(
    State(state): State<AppState>,
    payload: Result<Json<CreateShowtime>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Showtime>)> {
    let Json(body) = payload?;
    let showtime = state
        .catalog
        .create_showtime(
            body.movie_id,
            body.cinema_id,
            body.start_time,
            body.ticket_price,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(showtime)))
}

pub async fn get_showtime(
    State(state): State<AppState>,
    Path(id): Path<ShowtimeID>,
) -> AppResult<Json<Showtime>> {
    let showtime = state
        .unit_of_work
        .showtimes
        .get(id)
        .await?
        .ok_or_else(|| CatalogError::not_found("showtime", id))?;
    Ok(Json(showtime))
}

pub async fn delete_showtime(
    State(state): State<AppState>,
    Path(id): Path<ShowtimeID>,
) -> AppResult<StatusCode> {
    state.unit_of_work.showtimes.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
