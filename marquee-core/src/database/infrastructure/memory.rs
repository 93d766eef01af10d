//! Process-local adapter implementing every repository port.
//!
//! All tables share one lock so cascading deletes stay consistent.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_model::{
    Actor, ActorID, Cinema, CinemaID, Favorite, FavoriteID, Genre, GenreID,
    Movie, MovieID, MovieOnlineCinema, MovieStatus, OnlineCinema,
    OnlineCinemaID, Rating, RatingID, RatingStats, RatingValue, Showtime,
    ShowtimeID, User, UserID, UserVisit,
};
use tokio::sync::Mutex;

use crate::{
    database::ports::{
        catalog::{
            ActorsRepository, CinemasRepository, GenresRepository,
            OnlineCinemasRepository, ShowtimeFilter, ShowtimesRepository,
        },
        favorites::FavoritesRepository,
        movies::{MovieFilter, MoviesRepository},
        ratings::RatingsRepository,
        users::UsersRepository,
        visits::VisitsRepository,
    },
    error::{CatalogError, Result},
    query::PageWindow,
};

#[derive(Debug, Default)]
struct Tables {
    movies: HashMap<MovieID, Movie>,
    ratings: HashMap<RatingID, Rating>,
    users: HashMap<UserID, User>,
    cinemas: HashMap<CinemaID, Cinema>,
    showtimes: HashMap<ShowtimeID, Showtime>,
    actors: HashMap<ActorID, Actor>,
    genres: HashMap<GenreID, Genre>,
    favorites: HashMap<FavoriteID, Favorite>,
    online_cinemas: HashMap<OnlineCinemaID, OnlineCinema>,
    streaming_links: Vec<MovieOnlineCinema>,
    visits: Vec<UserVisit>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_filter(movie: &Movie, filter: &MovieFilter) -> bool {
    filter.status.is_none_or(|status| movie.status == status)
        && filter.genre.is_none_or(|genre| movie.genres.contains(&genre))
}

fn newest_release_first(a: &Movie, b: &Movie) -> std::cmp::Ordering {
    b.release_date
        .cmp(&a.release_date)
        .then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl MoviesRepository for InMemoryStore {
    async fn insert(&self, movie: &Movie) -> Result<()> {
        let mut tables = self.tables.lock().await;
        if tables.movies.contains_key(&movie.id) {
            return Err(CatalogError::Conflict(format!(
                "movie {} already exists",
                movie.id
            )));
        }
        tables.movies.insert(movie.id, movie.clone());
        Ok(())
    }

    async fn update(&self, movie: &Movie) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let stored = tables
            .movies
            .get_mut(&movie.id)
            .ok_or_else(|| CatalogError::not_found("movie", movie.id))?;
        let stats = stored.rating_stats();
        *stored = movie.clone();
        stored.average_rating = stats.average;
        stored.total_ratings = stats.count;
        Ok(())
    }

    async fn delete(&self, id: MovieID) -> Result<()> {
        let mut tables = self.tables.lock().await;
        if tables.movies.remove(&id).is_none() {
            return Err(CatalogError::not_found("movie", id));
        }
        tables.ratings.retain(|_, rating| rating.movie_id != id);
        tables.showtimes.retain(|_, showtime| showtime.movie_id != id);
        tables.favorites.retain(|_, favorite| favorite.movie_id != id);
        tables.streaming_links.retain(|link| link.movie_id != id);
        Ok(())
    }

    async fn get(&self, id: MovieID) -> Result<Option<Movie>> {
        let tables = self.tables.lock().await;
        Ok(tables.movies.get(&id).cloned())
    }

    async fn count(&self, filter: &MovieFilter) -> Result<u64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .movies
            .values()
            .filter(|movie| matches_filter(movie, filter))
            .count() as u64)
    }

    async fn list(
        &self,
        filter: &MovieFilter,
        window: PageWindow,
    ) -> Result<Vec<Movie>> {
        let tables = self.tables.lock().await;
        let mut movies: Vec<Movie> = tables
            .movies
            .values()
            .filter(|movie| matches_filter(movie, filter))
            .cloned()
            .collect();
        movies.sort_by(newest_release_first);
        Ok(window.slice(&movies))
    }

    async fn list_ids(&self) -> Result<Vec<MovieID>> {
        let tables = self.tables.lock().await;
        let mut ids: Vec<MovieID> = tables.movies.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    async fn update_status(
        &self,
        id: MovieID,
        status: MovieStatus,
    ) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let movie = tables
            .movies
            .get_mut(&id)
            .ok_or_else(|| CatalogError::not_found("movie", id))?;
        movie.status = status;
        movie.last_updated = Utc::now();
        Ok(())
    }

    async fn update_rating_stats(
        &self,
        id: MovieID,
        stats: RatingStats,
    ) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let movie = tables
            .movies
            .get_mut(&id)
            .ok_or_else(|| CatalogError::not_found("movie", id))?;
        movie.average_rating = stats.average;
        movie.total_ratings = stats.count;
        Ok(())
    }

    async fn trending(&self, limit: u32) -> Result<Vec<Movie>> {
        let tables = self.tables.lock().await;
        let mut movies: Vec<Movie> = tables
            .movies
            .values()
            .filter(|movie| {
                movie.status == MovieStatus::InTheaters
                    && movie.total_ratings > 0
            })
            .cloned()
            .collect();
        movies.sort_by(|a, b| {
            b.average_rating
                .total_cmp(&a.average_rating)
                .then_with(|| b.total_ratings.cmp(&a.total_ratings))
                .then_with(|| a.id.cmp(&b.id))
        });
        movies.truncate(limit as usize);
        Ok(movies)
    }
}

#[async_trait]
impl RatingsRepository for InMemoryStore {
    async fn upsert(
        &self,
        movie_id: MovieID,
        user_id: UserID,
        value: RatingValue,
        at: DateTime<Utc>,
    ) -> Result<Rating> {
        let mut tables = self.tables.lock().await;
        if !tables.movies.contains_key(&movie_id) {
            return Err(CatalogError::not_found("movie", movie_id));
        }
        if !tables.users.contains_key(&user_id) {
            return Err(CatalogError::not_found("user", user_id));
        }
        if let Some(existing) = tables.ratings.values_mut().find(|rating| {
            rating.movie_id == movie_id && rating.user_id == user_id
        }) {
            existing.value = value;
            existing.updated_at = at;
            return Ok(existing.clone());
        }
        let rating = Rating {
            id: RatingID::new(),
            movie_id,
            user_id,
            value,
            created_at: at,
            updated_at: at,
        };
        tables.ratings.insert(rating.id, rating.clone());
        Ok(rating)
    }

    async fn get(&self, id: RatingID) -> Result<Option<Rating>> {
        let tables = self.tables.lock().await;
        Ok(tables.ratings.get(&id).cloned())
    }

    async fn delete(&self, id: RatingID) -> Result<Option<Rating>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.ratings.remove(&id))
    }

    async fn list_for_movie(&self, movie_id: MovieID) -> Result<Vec<Rating>> {
        let tables = self.tables.lock().await;
        let mut ratings: Vec<Rating> = tables
            .ratings
            .values()
            .filter(|rating| rating.movie_id == movie_id)
            .cloned()
            .collect();
        ratings.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(ratings)
    }

    async fn values_for_movie(
        &self,
        movie_id: MovieID,
    ) -> Result<Vec<RatingValue>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .ratings
            .values()
            .filter(|rating| rating.movie_id == movie_id)
            .map(|rating| rating.value)
            .collect())
    }
}

#[async_trait]
impl UsersRepository for InMemoryStore {
    async fn insert(&self, user: &User) -> Result<()> {
        let mut tables = self.tables.lock().await;
        if tables
            .users
            .values()
            .any(|existing| existing.username == user.username)
        {
            return Err(CatalogError::Conflict(format!(
                "username '{}' is taken",
                user.username
            )));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get(&self, id: UserID) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.tables.lock().await.users.len() as u64)
    }

    async fn list(&self, window: PageWindow) -> Result<Vec<User>> {
        let tables = self.tables.lock().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(window.slice(&users))
    }

    async fn list_notifiable(&self) -> Result<Vec<User>> {
        let tables = self.tables.lock().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|user| user.email.as_deref().is_some_and(|e| !e.is_empty()))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}

#[async_trait]
impl FavoritesRepository for InMemoryStore {
    async fn add(
        &self,
        user_id: UserID,
        movie_id: MovieID,
        at: DateTime<Utc>,
    ) -> Result<Favorite> {
        let mut tables = self.tables.lock().await;
        if !tables.movies.contains_key(&movie_id) {
            return Err(CatalogError::not_found("movie", movie_id));
        }
        if !tables.users.contains_key(&user_id) {
            return Err(CatalogError::not_found("user", user_id));
        }
        if let Some(existing) = tables.favorites.values().find(|favorite| {
            favorite.user_id == user_id && favorite.movie_id == movie_id
        }) {
            return Ok(existing.clone());
        }
        let favorite = Favorite {
            id: FavoriteID::new(),
            user_id,
            movie_id,
            created_at: at,
        };
        tables.favorites.insert(favorite.id, favorite.clone());
        Ok(favorite)
    }

    async fn remove(&self, user_id: UserID, movie_id: MovieID) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.favorites.len();
        tables.favorites.retain(|_, favorite| {
            !(favorite.user_id == user_id && favorite.movie_id == movie_id)
        });
        Ok(tables.favorites.len() < before)
    }

    async fn count_for_user(&self, user_id: UserID) -> Result<u64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .favorites
            .values()
            .filter(|favorite| favorite.user_id == user_id)
            .count() as u64)
    }

    async fn list_for_user(
        &self,
        user_id: UserID,
        window: PageWindow,
    ) -> Result<Vec<Favorite>> {
        let tables = self.tables.lock().await;
        let mut favorites: Vec<Favorite> = tables
            .favorites
            .values()
            .filter(|favorite| favorite.user_id == user_id)
            .cloned()
            .collect();
        favorites.sort_by(|a, b| {
            b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id))
        });
        Ok(window.slice(&favorites))
    }
}

#[async_trait]
impl VisitsRepository for InMemoryStore {
    async fn record(&self, visit: &UserVisit) -> Result<()> {
        self.tables.lock().await.visits.push(visit.clone());
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.tables.lock().await.visits.len() as u64)
    }

    async fn list(&self, window: PageWindow) -> Result<Vec<UserVisit>> {
        let tables = self.tables.lock().await;
        let newest_first: Vec<UserVisit> =
            tables.visits.iter().rev().cloned().collect();
        Ok(window.slice(&newest_first))
    }
}

#[async_trait]
impl CinemasRepository for InMemoryStore {
    async fn insert(&self, cinema: &Cinema) -> Result<()> {
        let mut tables = self.tables.lock().await;
        tables.cinemas.insert(cinema.id, cinema.clone());
        Ok(())
    }

    async fn update(&self, cinema: &Cinema) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let stored = tables
            .cinemas
            .get_mut(&cinema.id)
            .ok_or_else(|| CatalogError::not_found("cinema", cinema.id))?;
        *stored = cinema.clone();
        Ok(())
    }

    async fn delete(&self, id: CinemaID) -> Result<()> {
        let mut tables = self.tables.lock().await;
        if tables.cinemas.remove(&id).is_none() {
            return Err(CatalogError::not_found("cinema", id));
        }
        tables.showtimes.retain(|_, showtime| showtime.cinema_id != id);
        Ok(())
    }

    async fn get(&self, id: CinemaID) -> Result<Option<Cinema>> {
        Ok(self.tables.lock().await.cinemas.get(&id).cloned())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.tables.lock().await.cinemas.len() as u64)
    }

    async fn list(&self, window: PageWindow) -> Result<Vec<Cinema>> {
        let tables = self.tables.lock().await;
        let mut cinemas: Vec<Cinema> =
            tables.cinemas.values().cloned().collect();
        cinemas.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(window.slice(&cinemas))
    }
}

fn matches_showtime(showtime: &Showtime, filter: &ShowtimeFilter) -> bool {
    filter.movie_id.is_none_or(|id| showtime.movie_id == id)
        && filter.cinema_id.is_none_or(|id| showtime.cinema_id == id)
}

#[async_trait]
impl ShowtimesRepository for InMemoryStore {
    async fn insert(&self, showtime: &Showtime) -> Result<()> {
        let mut tables = self.tables.lock().await;
        if !tables.movies.contains_key(&showtime.movie_id) {
            return Err(CatalogError::not_found("movie", showtime.movie_id));
        }
        if !tables.cinemas.contains_key(&showtime.cinema_id) {
            return Err(CatalogError::not_found("cinema", showtime.cinema_id));
        }
        tables.showtimes.insert(showtime.id, showtime.clone());
        Ok(())
    }

    async fn delete(&self, id: ShowtimeID) -> Result<()> {
        let mut tables = self.tables.lock().await;
        tables
            .showtimes
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CatalogError::not_found("showtime", id))
    }

    async fn get(&self, id: ShowtimeID) -> Result<Option<Showtime>> {
        Ok(self.tables.lock().await.showtimes.get(&id).cloned())
    }

    async fn count(&self, filter: &ShowtimeFilter) -> Result<u64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .showtimes
            .values()
            .filter(|showtime| matches_showtime(showtime, filter))
            .count() as u64)
    }

    async fn list(
        &self,
        filter: &ShowtimeFilter,
        window: PageWindow,
    ) -> Result<Vec<Showtime>> {
        let tables = self.tables.lock().await;
        let mut showtimes: Vec<Showtime> = tables
            .showtimes
            .values()
            .filter(|showtime| matches_showtime(showtime, filter))
            .cloned()
            .collect();
        showtimes.sort_by(|a, b| {
            a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id))
        });
        Ok(window.slice(&showtimes))
    }
}

#[async_trait]
impl ActorsRepository for InMemoryStore {
    async fn insert(&self, actor: &Actor) -> Result<()> {
        self.tables.lock().await.actors.insert(actor.id, actor.clone());
        Ok(())
    }

    async fn get(&self, id: ActorID) -> Result<Option<Actor>> {
        Ok(self.tables.lock().await.actors.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[ActorID]) -> Result<Vec<Actor>> {
        let tables = self.tables.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.actors.get(id).cloned())
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.tables.lock().await.actors.len() as u64)
    }

    async fn list(&self, window: PageWindow) -> Result<Vec<Actor>> {
        let tables = self.tables.lock().await;
        let mut actors: Vec<Actor> = tables.actors.values().cloned().collect();
        actors.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(window.slice(&actors))
    }
}

#[async_trait]
impl GenresRepository for InMemoryStore {
    async fn insert(&self, genre: &Genre) -> Result<()> {
        let mut tables = self.tables.lock().await;
        if tables.genres.values().any(|existing| existing.name == genre.name) {
            return Err(CatalogError::Conflict(format!(
                "genre '{}' already exists",
                genre.name
            )));
        }
        tables.genres.insert(genre.id, genre.clone());
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.tables.lock().await.genres.len() as u64)
    }

    async fn list(&self, window: PageWindow) -> Result<Vec<Genre>> {
        let tables = self.tables.lock().await;
        let mut genres: Vec<Genre> = tables.genres.values().cloned().collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(window.slice(&genres))
    }

    async fn exists_all(&self, ids: &[GenreID]) -> Result<bool> {
        let tables = self.tables.lock().await;
        Ok(ids.iter().all(|id| tables.genres.contains_key(id)))
    }
}

#[async_trait]
impl OnlineCinemasRepository for InMemoryStore {
    async fn insert(&self, cinema: &OnlineCinema) -> Result<()> {
        self.tables
            .lock()
            .await
            .online_cinemas
            .insert(cinema.id, cinema.clone());
        Ok(())
    }

    async fn get(&self, id: OnlineCinemaID) -> Result<Option<OnlineCinema>> {
        Ok(self.tables.lock().await.online_cinemas.get(&id).cloned())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.tables.lock().await.online_cinemas.len() as u64)
    }

    async fn list(&self, window: PageWindow) -> Result<Vec<OnlineCinema>> {
        let tables = self.tables.lock().await;
        let mut cinemas: Vec<OnlineCinema> =
            tables.online_cinemas.values().cloned().collect();
        cinemas.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(window.slice(&cinemas))
    }

    async fn link(&self, link: &MovieOnlineCinema) -> Result<()> {
        let mut tables = self.tables.lock().await;
        if !tables.movies.contains_key(&link.movie_id) {
            return Err(CatalogError::not_found("movie", link.movie_id));
        }
        if !tables.online_cinemas.contains_key(&link.online_cinema_id) {
            return Err(CatalogError::not_found(
                "online cinema",
                link.online_cinema_id,
            ));
        }
        if tables.streaming_links.iter().any(|existing| {
            existing.movie_id == link.movie_id
                && existing.online_cinema_id == link.online_cinema_id
        }) {
            return Err(CatalogError::Conflict(format!(
                "movie {} is already linked to online cinema {}",
                link.movie_id, link.online_cinema_id
            )));
        }
        tables.streaming_links.push(link.clone());
        Ok(())
    }

    async fn list_for_movie(
        &self,
        movie_id: MovieID,
    ) -> Result<Vec<OnlineCinema>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .streaming_links
            .iter()
            .filter(|link| link.movie_id == movie_id)
            .filter_map(|link| {
                tables.online_cinemas.get(&link.online_cinema_id).cloned()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn movie(title: &str) -> Movie {
        Movie {
            id: MovieID::new(),
            title: title.to_string(),
            description: String::new(),
            release_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            duration: 100,
            poster: None,
            trailer_url: None,
            genres: Vec::new(),
            cast: Vec::new(),
            average_rating: 0.0,
            total_ratings: 0,
            status: MovieStatus::InTheaters,
            created_at: Utc::now(),
            last_updated: Utc::now(),
        }
    }

    fn user(name: &str) -> User {
        User {
            id: UserID::new(),
            username: name.to_string(),
            email: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn resubmitted_rating_overwrites_value() {
        let store = InMemoryStore::new();
        let m = movie("Heat");
        let u = user("neil");
        MoviesRepository::insert(&store, &m).await.unwrap();
        UsersRepository::insert(&store, &u).await.unwrap();

        let first = store
            .upsert(m.id, u.id, RatingValue::new(3).unwrap(), Utc::now())
            .await
            .unwrap();
        let second = store
            .upsert(m.id, u.id, RatingValue::new(9).unwrap(), Utc::now())
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let values = store.values_for_movie(m.id).await.unwrap();
        assert_eq!(values, vec![RatingValue::new(9).unwrap()]);
    }

    #[tokio::test]
    async fn deleting_movie_cascades() {
        let store = InMemoryStore::new();
        let m = movie("Heat");
        let u = user("neil");
        MoviesRepository::insert(&store, &m).await.unwrap();
        UsersRepository::insert(&store, &u).await.unwrap();
        store
            .upsert(m.id, u.id, RatingValue::new(7).unwrap(), Utc::now())
            .await
            .unwrap();
        store.add(u.id, m.id, Utc::now()).await.unwrap();

        MoviesRepository::delete(&store, m.id).await.unwrap();

        assert!(store.values_for_movie(m.id).await.unwrap().is_empty());
        assert_eq!(store.count_for_user(u.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn favorites_are_idempotent() {
        let store = InMemoryStore::new();
        let m = movie("Heat");
        let u = user("neil");
        MoviesRepository::insert(&store, &m).await.unwrap();
        UsersRepository::insert(&store, &u).await.unwrap();

        let a = store.add(u.id, m.id, Utc::now()).await.unwrap();
        let b = store.add(u.id, m.id, Utc::now()).await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(store.count_for_user(u.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = InMemoryStore::new();
        UsersRepository::insert(&store, &user("neil")).await.unwrap();
        let err = UsersRepository::insert(&store, &user("neil"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Conflict(_)));
    }
}
