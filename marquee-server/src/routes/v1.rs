use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::{
    AppState,
    handlers::{
        actors, cinemas, genres, movies, online_cinemas, ratings, showtimes,
        system, users, visits,
    },
};

/// Create all v1 API routes
pub fn create_v1_router(state: AppState) -> Router<AppState> {
    let router = Router::new()
        .route("/ping", get(system::ping_handler))
        .route("/health", get(system::health_handler))
        .merge(create_movie_routes())
        .merge(create_catalog_routes())
        .merge(create_user_routes());

    super::with_visit_recording(router, state)
}

fn create_movie_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/movies",
            get(movies::list_movies).post(movies::create_movie),
        )
        .route("/movies/filter", get(movies::filter_movies))
        .route("/movies/trending", get(movies::trending_movies))
        .route("/movies/bulk-status", post(movies::bulk_refresh_status))
        .route(
            "/movies/{id}",
            get(movies::get_movie)
                .put(movies::update_movie)
                .delete(movies::delete_movie),
        )
        .route("/movies/{id}/actors", get(movies::movie_actors))
        .route(
            "/movies/{id}/ratings",
            get(movies::list_ratings).post(movies::submit_rating),
        )
        .route(
            "/movies/{id}/favorite",
            post(movies::add_favorite).delete(movies::remove_favorite),
        )
        .route(
            "/movies/{id}/online-cinemas",
            get(movies::movie_online_cinemas).post(movies::link_online_cinema),
        )
        .route("/ratings/{id}", delete(ratings::delete_rating))
}

fn create_catalog_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/cinemas",
            get(cinemas::list_cinemas).post(cinemas::create_cinema),
        )
        .route(
            "/cinemas/{id}",
            get(cinemas::get_cinema)
                .put(cinemas::update_cinema)
                .delete(cinemas::delete_cinema),
        )
        .route(
            "/showtimes",
            get(showtimes::list_showtimes).post(showtimes::create_showtime),
        )
        .route(
            "/showtimes/{id}",
            get(showtimes::get_showtime).delete(showtimes::delete_showtime),
        )
        .route("/actors", get(actors::list_actors).post(actors::create_actor))
        .route("/actors/{id}", get(actors::get_actor))
        .route("/genres", get(genres::list_genres).post(genres::create_genre))
        .route(
            "/online-cinemas",
            get(online_cinemas::list_online_cinemas)
                .post(online_cinemas::create_online_cinema),
        )
}

fn create_user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/{id}/favorites", get(users::list_favorites))
        .route("/visits", get(visits::list_visits))
}
