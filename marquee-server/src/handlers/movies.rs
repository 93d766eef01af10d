use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::Utc;
use marquee_core::{
    database::ports::movies::MovieFilter,
    infra::cache::CachedOperation,
    query::Page,
    tasks::SweepReport,
};
use marquee_model::{
    Actor, Favorite, GenreID, Movie, MovieDraft, MovieID, MovieOnlineCinema,
    MovieStatus, OnlineCinema, OnlineCinemaID, Rating, UserID,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ListQuery, paged};
use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

pub const DEFAULT_TRENDING_LIMIT: u32 = 5;
pub const MAX_TRENDING_LIMIT: u32 = 50;

pub async fn list_movies(
    State(state): State<AppState>,
    query: ListQuery,
) -> AppResult<Json<Page<Movie>>> {
    let filter = MovieFilter {
        status: None,
        genre: query.parse::<GenreID>("genre")?,
    };
    let uow = &state.unit_of_work;
    let page = state
        .cache
        .get_or_fetch(CachedOperation::Movies, &query.params, || {
            paged(query.page, uow.movies.count(&filter), |window| {
                uow.movies.list(&filter, window)
            })
        })
        .await?;
    Ok(Json(page))
}

/// `status` is required and accepts `upcoming`/`soon`, `in_theaters`/`now`
/// and `ended`.
pub async fn filter_movies(
    State(state): State<AppState>,
    query: ListQuery,
) -> AppResult<Json<Page<Movie>>> {
    let status = query
        .parse::<MovieStatus>("status")?
        .ok_or_else(|| AppError::bad_request("status: query parameter is required"))?;
    let filter = MovieFilter {
        status: Some(status),
        genre: query.parse::<GenreID>("genre")?,
    };
    let uow = &state.unit_of_work;
    let page = state
        .cache
        .get_or_fetch(CachedOperation::MovieFilter, &query.params, || {
            paged(query.page, uow.movies.count(&filter), |window| {
                uow.movies.list(&filter, window)
            })
        })
        .await?;
    Ok(Json(page))
}

fn trending_limit(query: &ListQuery) -> u32 {
    match query.get("limit").map(|raw| raw.trim().parse::<i64>()) {
        Some(Ok(n)) if n >= 1 => {
            u32::try_from(n).map_or(MAX_TRENDING_LIMIT, |n| n.min(MAX_TRENDING_LIMIT))
        }
        _ => DEFAULT_TRENDING_LIMIT,
    }
}

/// Best-rated movies currently in theaters.
pub async fn trending_movies(
    State(state): State<AppState>,
    query: ListQuery,
) -> AppResult<Json<Vec<Movie>>> {
    let limit = trending_limit(&query);
    let uow = &state.unit_of_work;
    let movies = state
        .cache
        .get_or_fetch(CachedOperation::Trending, &query.params, || {
            uow.movies.trending(limit)
        })
        .await?;
    Ok(Json(movies))
}

pub async fn create_movie(
    State(state): State<AppState>,
    payload: Result<Json<MovieDraft>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    let Json(draft) = payload?;
    let movie = state.movies.create(draft, Utc::now().date_naive()).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<MovieID>,
) -> AppResult<Json<Movie>> {
    Ok(Json(state.movies.get(id).await?))
}

pub async fn update_movie(
    State(state): State<AppState>,
    Path(id): Path<MovieID>,
    payload: Result<Json<MovieDraft>, JsonRejection>,
) -> AppResult<Json<Movie>> {
    let Json(draft) = payload?;
    let movie = state
        .movies
        .update(id, draft, Utc::now().date_naive())
        .await?;
    Ok(Json(movie))
}

pub async fn delete_movie(
    State(state): State<AppState>,
    Path(id): Path<MovieID>,
) -> AppResult<StatusCode> {
    state.movies.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct BulkStatusRequest {
    /// Empty refreshes every movie.
    #[serde(default)]
    pub movie_ids: Vec<MovieID>,
}

/// Re-resolves statuses on demand instead of waiting for the sweep.
pub async fn bulk_refresh_status(
    State(state): State<AppState>,
    payload: Result<Json<BulkStatusRequest>, JsonRejection>,
) -> AppResult<Json<SweepReport>> {
    let Json(request) = payload?;
    let report = state
        .movies
        .refresh_statuses(&request.movie_ids, Utc::now().date_naive())
        .await?;
    info!(
        requested = request.movie_ids.len(),
        changed = report.changed,
        "bulk status refresh"
    );
    Ok(Json(report))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditedActor {
    #[serde(flatten)]
    pub actor: Actor,
    pub role: String,
    pub is_main_role: bool,
}

/// Cast with actor details, main roles first.
pub async fn movie_actors(
    State(state): State<AppState>,
    Path(id): Path<MovieID>,
) -> AppResult<Json<Vec<CreditedActor>>> {
    let movie = state.movies.get(id).await?;
    let ids: Vec<_> = movie.cast.iter().map(|member| member.actor_id).collect();
    let actors = state.unit_of_work.actors.get_many(&ids).await?;

    let ordered = movie
        .main_cast()
        .chain(movie.cast.iter().filter(|member| !member.is_main_role));
    let credited = ordered
        .filter_map(|member| {
            actors
                .iter()
                .find(|actor| actor.id == member.actor_id)
                .map(|actor| CreditedActor {
                    actor: actor.clone(),
                    role: member.role.clone(),
                    is_main_role: member.is_main_role,
                })
        })
        .collect();
    Ok(Json(credited))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MovieRatings {
    pub average_rating: f64,
    pub total_ratings: u32,
    pub ratings: Vec<Rating>,
}

pub async fn list_ratings(
    State(state): State<AppState>,
    Path(id): Path<MovieID>,
) -> AppResult<Json<MovieRatings>> {
    let movie = state.movies.get(id).await?;
    let ratings = state.ratings.list_for_movie(id).await?;
    Ok(Json(MovieRatings {
        average_rating: movie.average_rating,
        total_ratings: movie.total_ratings,
        ratings,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SubmitRating {
    pub user_id: UserID,
    pub rating: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RatingAccepted {
    pub rating: Rating,
    pub average_rating: f64,
    pub total_ratings: u32,
}

/// Creates or overwrites the user's rating and returns the fresh aggregate.
pub async fn submit_rating(
    State(state): State<AppState>,
    Path(id): Path<MovieID>,
    payload: Result<Json<SubmitRating>, JsonRejection>,
) -> AppResult<(StatusCode, Json<RatingAccepted>)> {
    let Json(body) = payload?;
    let (rating, stats) = state
        .ratings
        .submit(id, body.user_id, body.rating)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(RatingAccepted {
            rating,
            average_rating: stats.average,
            total_ratings: stats.count,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub user_id: UserID,
}

pub async fn add_favorite(
    State(state): State<AppState>,
    Path(id): Path<MovieID>,
    payload: Result<Json<FavoriteRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Favorite>)> {
    let Json(body) = payload?;
    let favorite = state.catalog.add_favorite(body.user_id, id).await?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    Path(id): Path<MovieID>,
    payload: Result<Json<FavoriteRequest>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Json(body) = payload?;
    state.catalog.remove_favorite(body.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn movie_online_cinemas(
    State(state): State<AppState>,
    Path(id): Path<MovieID>,
) -> AppResult<Json<Vec<OnlineCinema>>> {
    state.movies.get(id).await?;
    let platforms = state.unit_of_work.online_cinemas.list_for_movie(id).await?;
    Ok(Json(platforms))
}

#[derive(Debug, Deserialize)]
pub struct LinkOnlineCinema {
    pub online_cinema_id: OnlineCinemaID,
}

pub async fn link_online_cinema(
    State(state): State<AppState>,
    Path(id): Path<MovieID>,
    payload: Result<Json<LinkOnlineCinema>, JsonRejection>,
) -> AppResult<(StatusCode, Json<MovieOnlineCinema>)> {
    let Json(body) = payload?;
    let link = state
        .catalog
        .link_online_cinema(id, body.online_cinema_id)
        .await?;
    Ok((StatusCode::CREATED, Json(link)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trending_limit_defaults_and_caps() {
        let limit = |raw: &str| trending_limit(&ListQuery::from_query_string(Some(raw)));
        assert_eq!(limit(""), DEFAULT_TRENDING_LIMIT);
        assert_eq!(limit("limit=0"), DEFAULT_TRENDING_LIMIT);
        assert_eq!(limit("limit=ten"), DEFAULT_TRENDING_LIMIT);
        assert_eq!(limit("limit=3"), 3);
        assert_eq!(limit("limit=1000"), MAX_TRENDING_LIMIT);
    }
}
