use axum::{Json, extract::State};
use marquee_core::query::Page;
use marquee_model::UserVisit;

use super::{ListQuery, paged};
use crate::infra::{app_state::AppState, errors::AppResult};

/// Newest first. Never cached.
pub async fn list_visits(
    State(state): State<AppState>,
    query: ListQuery,
) -> AppResult<Json<Page<UserVisit>>> {
    let visits = &state.unit_of_work.visits;
    let page = paged(query.page, visits.count(), |window| visits.list(window)).await?;
    Ok(Json(page))
}
