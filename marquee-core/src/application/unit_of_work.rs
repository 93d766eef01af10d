use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;

use sqlx::PgPool;

use crate::database::{
    infrastructure::{
        InMemoryStore,
        postgres::{
            PostgresActorsRepository, PostgresCinemasRepository,
            PostgresFavoritesRepository, PostgresGenresRepository,
            PostgresMoviesRepository, PostgresOnlineCinemasRepository,
            PostgresRatingsRepository, PostgresShowtimesRepository,
            PostgresUsersRepository, PostgresVisitsRepository,
        },
    },
    ports::{
        catalog::{
            ActorsRepository, CinemasRepository, GenresRepository,
            OnlineCinemasRepository, ShowtimesRepository,
        },
        favorites::FavoritesRepository,
        movies::MoviesRepository,
        ratings::RatingsRepository,
        users::UsersRepository,
        visits::VisitsRepository,
    },
};

/// Aggregates all repository ports used by application services.
#[derive(Clone)]
pub struct AppUnitOfWork {
    pub movies: Arc<dyn MoviesRepository>,
    pub ratings: Arc<dyn RatingsRepository>,
    pub users: Arc<dyn UsersRepository>,
    pub favorites: Arc<dyn FavoritesRepository>,
    pub visits: Arc<dyn VisitsRepository>,

    pub cinemas: Arc<dyn CinemasRepository>,
    pub showtimes: Arc<dyn ShowtimesRepository>,
    pub actors: Arc<dyn ActorsRepository>,
    pub genres: Arc<dyn GenresRepository>,
    pub online_cinemas: Arc<dyn OnlineCinemasRepository>,
}

impl fmt::Debug for AppUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUnitOfWork")
            .field("movies", &type_name_of_val(self.movies.as_ref()))
            .field("ratings", &type_name_of_val(self.ratings.as_ref()))
            .field("users", &type_name_of_val(self.users.as_ref()))
            .field("favorites", &type_name_of_val(self.favorites.as_ref()))
            .field("visits", &type_name_of_val(self.visits.as_ref()))
            .field("cinemas", &type_name_of_val(self.cinemas.as_ref()))
            .field("showtimes", &type_name_of_val(self.showtimes.as_ref()))
            .field("actors", &type_name_of_val(self.actors.as_ref()))
            .field("genres", &type_name_of_val(self.genres.as_ref()))
            .field(
                "online_cinemas",
                &type_name_of_val(self.online_cinemas.as_ref()),
            )
            .finish()
    }
}

impl AppUnitOfWork {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            movies: Arc::new(PostgresMoviesRepository::new(pool.clone())),
            ratings: Arc::new(PostgresRatingsRepository::new(pool.clone())),
            users: Arc::new(PostgresUsersRepository::new(pool.clone())),
            favorites: Arc::new(PostgresFavoritesRepository::new(pool.clone())),
            visits: Arc::new(PostgresVisitsRepository::new(pool.clone())),
            cinemas: Arc::new(PostgresCinemasRepository::new(pool.clone())),
            showtimes: Arc::new(PostgresShowtimesRepository::new(pool.clone())),
            actors: Arc::new(PostgresActorsRepository::new(pool.clone())),
            genres: Arc::new(PostgresGenresRepository::new(pool.clone())),
            online_cinemas: Arc::new(PostgresOnlineCinemasRepository::new(pool)),
        }
    }

    /// Every port backed by one shared in-process store.
    pub fn in_memory() -> Self {
        Self::from_store(InMemoryStore::new())
    }

    pub fn from_store(store: InMemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            movies: store.clone(),
            ratings: store.clone(),
            users: store.clone(),
            favorites: store.clone(),
            visits: store.clone(),
            cinemas: store.clone(),
            showtimes: store.clone(),
            actors: store.clone(),
            genres: store.clone(),
            online_cinemas: store,
        }
    }
}
