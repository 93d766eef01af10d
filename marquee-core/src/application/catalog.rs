//! Validated writes for reference records, users and favorites.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use marquee_model::{
    Actor, ActorID, Cinema, CinemaID, Favorite, Genre, GenreID, MovieID,
    MovieOnlineCinema, OnlineCinema, OnlineCinemaID, Showtime, ShowtimeID,
    StreamingLinkID, User, UserID, UserVisit, VisitID, catalog::require_name,
};
use rust_decimal::Decimal;

use crate::{
    application::unit_of_work::AppUnitOfWork,
    error::{CatalogError, Result},
};

#[derive(Debug, Clone)]
pub struct CatalogService {
    uow: Arc<AppUnitOfWork>,
}

fn require_url(field: &'static str, raw: &str) -> Result<String> {
    let parsed = url::Url::parse(raw.trim()).map_err(|e| {
        CatalogError::Validation(format!("{field}: {e}"))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed.to_string()),
        other => Err(CatalogError::Validation(format!(
            "{field}: unsupported scheme '{other}'"
        ))),
    }
}

impl CatalogService {
    pub fn new(uow: Arc<AppUnitOfWork>) -> Self {
        Self { uow }
    }

    pub async fn create_user(&self, username: &str, email: Option<String>) -> Result<User> {
        let username = require_name("username", username)?;
        let email = email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        if let Some(email) = &email
            && !email.contains('@')
        {
            return Err(CatalogError::Validation(format!(
                "email: '{email}' is not an address"
            )));
        }
        let user = User {
            id: UserID::new(),
            username,
            email,
            created_at: Utc::now(),
        };
        self.uow.users.insert(&user).await?;
        Ok(user)
    }

    pub async fn require_user(&self, id: UserID) -> Result<User> {
        self.uow
            .users
            .get(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("user", id))
    }

    pub async fn create_cinema(&self, name: &str, address: &str) -> Result<Cinema> {
        let cinema = Cinema {
            id: CinemaID::new(),
            name: require_name("name", name)?,
            address: require_name("address", address)?,
        };
        self.uow.cinemas.insert(&cinema).await?;
        Ok(cinema)
    }

    pub async fn update_cinema(
        &self,
        id: CinemaID,
        name: &str,
        address: &str,
    ) -> Result<Cinema> {
        let cinema = Cinema {
            id,
            name: require_name("name", name)?,
            address: require_name("address", address)?,
        };
        self.uow.cinemas.update(&cinema).await?;
        Ok(cinema)
    }

    pub async fn create_showtime(
        &self,
        movie_id: MovieID,
        cinema_id: CinemaID,
        start_time: DateTime<Utc>,
        ticket_price: Decimal,
    ) -> Result<Showtime> {
        let ticket_price = Showtime::normalize_price(ticket_price)?;
        if self.uow.movies.get(movie_id).await?.is_none() {
            return Err(CatalogError::not_found("movie", movie_id));
        }
        if self.uow.cinemas.get(cinema_id).await?.is_none() {
            return Err(CatalogError::not_found("cinema", cinema_id));
        }
        let showtime = Showtime {
            id: ShowtimeID::new(),
            movie_id,
            cinema_id,
            start_time,
            ticket_price,
        };
        self.uow.showtimes.insert(&showtime).await?;
        Ok(showtime)
    }

    pub async fn create_actor(
        &self,
        name: &str,
        date_of_birth: Option<NaiveDate>,
        biography: String,
    ) -> Result<Actor> {
        let actor = Actor {
            id: ActorID::new(),
            name: require_name("name", name)?,
            date_of_birth,
            biography,
        };
        self.uow.actors.insert(&actor).await?;
        Ok(actor)
    }

    pub async fn create_genre(&self, name: &str) -> Result<Genre> {
        let genre = Genre {
            id: GenreID::new(),
            name: require_name("name", name)?,
        };
        self.uow.genres.insert(&genre).await?;
        Ok(genre)
    }

    pub async fn create_online_cinema(&self, name: &str, url: &str) -> Result<OnlineCinema> {
        let cinema = OnlineCinema {
            id: OnlineCinemaID::new(),
            name: require_name("name", name)?,
            url: require_url("url", url)?,
        };
        self.uow.online_cinemas.insert(&cinema).await?;
        Ok(cinema)
    }

    pub async fn link_online_cinema(
        &self,
        movie_id: MovieID,
        online_cinema_id: OnlineCinemaID,
    ) -> Result<MovieOnlineCinema> {
        if self.uow.movies.get(movie_id).await?.is_none() {
            return Err(CatalogError::not_found("movie", movie_id));
        }
        if self.uow.online_cinemas.get(online_cinema_id).await?.is_none() {
            return Err(CatalogError::not_found("online cinema", online_cinema_id));
        }
        let link = MovieOnlineCinema {
            id: StreamingLinkID::new(),
            movie_id,
            online_cinema_id,
        };
        self.uow.online_cinemas.link(&link).await?;
        Ok(link)
    }

    pub async fn add_favorite(&self, user_id: UserID, movie_id: MovieID) -> Result<Favorite> {
        self.require_user(user_id).await?;
        if self.uow.movies.get(movie_id).await?.is_none() {
            return Err(CatalogError::not_found("movie", movie_id));
        }
        self.uow.favorites.add(user_id, movie_id, Utc::now()).await
    }

    pub async fn remove_favorite(&self, user_id: UserID, movie_id: MovieID) -> Result<()> {
        if self.uow.favorites.remove(user_id, movie_id).await? {
            Ok(())
        } else {
            Err(CatalogError::NotFound(format!(
                "favorite for user {user_id} and movie {movie_id}"
            )))
        }
    }

    /// Audit entry for one handled request.
    pub async fn record_visit(
        &self,
        user_id: Option<UserID>,
        path: String,
        method: String,
        ip_address: Option<String>,
        user_agent: String,
    ) -> Result<()> {
        let visit = UserVisit {
            id: VisitID::new(),
            user_id,
            path,
            method,
            ip_address,
            user_agent,
            visited_at: Utc::now(),
        };
        self.uow.visits.record(&visit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[tokio::test]
    async fn negative_ticket_price_is_rejected() {
        let svc = CatalogService::new(Arc::new(AppUnitOfWork::in_memory()));
        let err = svc
            .create_showtime(
                MovieID::new(),
                CinemaID::new(),
                Utc::now(),
                Decimal::from_str("-5.00").unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[tokio::test]
    async fn showtime_for_unknown_movie_is_not_found() {
        let svc = CatalogService::new(Arc::new(AppUnitOfWork::in_memory()));
        let cinema = svc.create_cinema("Odeon", "1 High St").await.unwrap();
        let err = svc
            .create_showtime(MovieID::new(), cinema.id, Utc::now(), Decimal::new(950, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_genre_names_conflict() {
        let svc = CatalogService::new(Arc::new(AppUnitOfWork::in_memory()));
        svc.create_genre("Drama").await.unwrap();
        let err = svc.create_genre(" Drama ").await.unwrap_err();
        assert!(matches!(err, CatalogError::Conflict(_)));
    }

    #[tokio::test]
    async fn online_cinema_requires_http_url() {
        let svc = CatalogService::new(Arc::new(AppUnitOfWork::in_memory()));
        assert!(svc.create_online_cinema("Flix", "ftp://flix").await.is_err());
        let ok = svc
            .create_online_cinema("Flix", "https://flix.example")
            .await
            .unwrap();
        assert_eq!(ok.url, "https://flix.example/");
    }
}
