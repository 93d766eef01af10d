use async_trait::async_trait;
use marquee_model::{GenreID, Movie, MovieID, MovieStatus, RatingStats};

use crate::error::Result;
use crate::query::PageWindow;

/// Listing predicate shared by the collection and filter endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieFilter {
    pub status: Option<MovieStatus>,
    pub genre: Option<GenreID>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MoviesRepository: Send + Sync {
    async fn insert(&self, movie: &Movie) -> Result<()>;

    /// Persists writable fields, status and `last_updated`. Rating stats are
    /// only written through [`MoviesRepository::update_rating_stats`].
    async fn update(&self, movie: &Movie) -> Result<()>;

    /// Removes the movie together with its ratings, showtimes, favorites and
    /// streaming links.
    async fn delete(&self, id: MovieID) -> Result<()>;

    async fn get(&self, id: MovieID) -> Result<Option<Movie>>;

    async fn count(&self, filter: &MovieFilter) -> Result<u64>;

    /// Newest release first.
    async fn list(
        &self,
        filter: &MovieFilter,
        window: PageWindow,
    ) -> Result<Vec<Movie>>;

    async fn list_ids(&self) -> Result<Vec<MovieID>>;

    async fn update_status(&self, id: MovieID, status: MovieStatus)
    -> Result<()>;

    async fn update_rating_stats(
        &self,
        id: MovieID,
        stats: RatingStats,
    ) -> Result<()>;

    /// Rated movies currently in theaters, best average first.
    async fn trending(&self, limit: u32) -> Result<Vec<Movie>>;
}
