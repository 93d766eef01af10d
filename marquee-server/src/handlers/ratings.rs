use axum::{
    Json,
    extract::{Path, State},
};
use marquee_model::{RatingID, RatingStats};

use crate::infra::{app_state::AppState, errors::AppResult};

/// Removes a rating and returns the movie's recomputed aggregate.
pub async fn delete_rating(
    State(state): State<AppState>,
    Path(id): Path<RatingID>,
) -> AppResult<Json<RatingStats>> {
    Ok(Json(state.ratings.delete(id).await?))
}
