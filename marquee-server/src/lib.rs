//! # Marquee Server
//!
//! REST surface for the Marquee movie showcase: movies with derived status
//! and rating aggregates, cinemas and showtimes, actors, genres, streaming
//! platforms, favorites and a per-request visit log. Listing endpoints are
//! paginated and served through a read-through cache.

pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;
