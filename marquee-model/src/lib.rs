//! Core data model definitions shared across Marquee crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod catalog;
pub mod error;
pub mod ids;
pub mod movie;
pub mod rating;
pub mod status;
pub mod user;

// Curated re-exports for downstream consumers.
pub use catalog::{
    Actor, Cinema, Genre, MovieOnlineCinema, OnlineCinema, Showtime,
};
pub use error::{ModelError, Result as ModelResult};
pub use ids::{
    ActorID, CinemaID, FavoriteID, GenreID, MovieID, OnlineCinemaID,
    RatingID, ShowtimeID, StreamingLinkID, UserID, VisitID,
};
pub use movie::{CastMember, Movie, MovieDraft, MovieTitle};
pub use rating::{Rating, RatingStats, RatingValue};
pub use status::MovieStatus;
pub use user::{Favorite, User, UserVisit};
