//! Reference data around movies: venues, screenings, people, genres and
//! streaming platforms.

use async_trait::async_trait;
use marquee_model::{
    Actor, ActorID, Cinema, CinemaID, Genre, GenreID, MovieID, MovieOnlineCinema,
    OnlineCinema, OnlineCinemaID, Showtime, ShowtimeID,
};

use crate::error::Result;
use crate::query::PageWindow;

#[async_trait]
pub trait CinemasRepository: Send + Sync {
    async fn insert(&self, cinema: &Cinema) -> Result<()>;
    async fn update(&self, cinema: &Cinema) -> Result<()>;
    async fn delete(&self, id: CinemaID) -> Result<()>;
    async fn get(&self, id: CinemaID) -> Result<Option<Cinema>>;
    async fn count(&self) -> Result<u64>;
    async fn list(&self, window: PageWindow) -> Result<Vec<Cinema>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShowtimeFilter {
    pub movie_id: Option<MovieID>,
    pub cinema_id: Option<CinemaID>,
}

#[async_trait]
pub trait ShowtimesRepository: Send + Sync {
    async fn insert(&self, showtime: &Showtime) -> Result<()>;
    async fn delete(&self, id: ShowtimeID) -> Result<()>;
    async fn get(&self, id: ShowtimeID) -> Result<Option<Showtime>>;
    async fn count(&self, filter: &ShowtimeFilter) -> Result<u64>;
    /// Earliest start time first.
    async fn list(
        &self,
        filter: &ShowtimeFilter,
        window: PageWindow,
    ) -> Result<Vec<Showtime>>;
}

#[async_trait]
pub trait ActorsRepository: Send + Sync {
    async fn insert(&self, actor: &Actor) -> Result<()>;
    async fn get(&self, id: ActorID) -> Result<Option<Actor>>;
    async fn get_many(&self, ids: &[ActorID]) -> Result<Vec<Actor>>;
    async fn count(&self) -> Result<u64>;
    async fn list(&self, window: PageWindow) -> Result<Vec<Actor>>;
}

#[async_trait]
pub trait GenresRepository: Send + Sync {
    /// Fails with a conflict when the name is taken.
    async fn insert(&self, genre: &Genre) -> Result<()>;
    async fn count(&self) -> Result<u64>;
    async fn list(&self, window: PageWindow) -> Result<Vec<Genre>>;
    async fn exists_all(&self, ids: &[GenreID]) -> Result<bool>;
}

#[async_trait]
pub trait OnlineCinemasRepository: Send + Sync {
    async fn insert(&self, cinema: &OnlineCinema) -> Result<()>;
    async fn get(&self, id: OnlineCinemaID) -> Result<Option<OnlineCinema>>;
    async fn count(&self) -> Result<u64>;
    async fn list(&self, window: PageWindow) -> Result<Vec<OnlineCinema>>;

    /// Fails with a conflict when the pair is already linked.
    async fn link(&self, link: &MovieOnlineCinema) -> Result<()>;
    async fn list_for_movie(
        &self,
        movie_id: MovieID,
    ) -> Result<Vec<OnlineCinema>>;
}
