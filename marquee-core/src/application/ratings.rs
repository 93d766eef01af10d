use std::sync::Arc;

use chrono::Utc;
use marquee_model::{MovieID, Rating, RatingID, RatingStats, RatingValue, UserID};
use tracing::debug;

use crate::{
    application::unit_of_work::AppUnitOfWork,
    domain::ratings::aggregate,
    error::{CatalogError, Result},
};

/// Rating writes followed by an eager recomputation of the movie aggregate.
///
/// Recomputation always reads the full rating set back from storage, so it is
/// idempotent with the periodic sweep.
#[derive(Debug, Clone)]
pub struct RatingService {
    uow: Arc<AppUnitOfWork>,
}

impl RatingService {
    pub fn new(uow: Arc<AppUnitOfWork>) -> Self {
        Self { uow }
    }

    /// Validates, stores (or overwrites) the user's rating and refreshes the
    /// movie aggregate.
    pub async fn submit(
        &self,
        movie_id: MovieID,
        user_id: UserID,
        raw_value: i64,
    ) -> Result<(Rating, RatingStats)> {
        let value = RatingValue::new(raw_value)?;

        if self.uow.movies.get(movie_id).await?.is_none() {
            return Err(CatalogError::not_found("movie", movie_id));
        }
        if self.uow.users.get(user_id).await?.is_none() {
            return Err(CatalogError::not_found("user", user_id));
        }

        let rating = self
            .uow
            .ratings
            .upsert(movie_id, user_id, value, Utc::now())
            .await?;
        let stats = self.recompute(movie_id).await?;
        Ok((rating, stats))
    }

    pub async fn delete(&self, rating_id: RatingID) -> Result<RatingStats> {
        let removed = self
            .uow
            .ratings
            .delete(rating_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("rating", rating_id))?;
        self.recompute(removed.movie_id).await
    }

    /// Recomputes the aggregate from the stored ratings and projects it onto
    /// the movie.
    pub async fn recompute(&self, movie_id: MovieID) -> Result<RatingStats> {
        let values = self.uow.ratings.values_for_movie(movie_id).await?;
        let stats = aggregate(values);
        self.uow.movies.update_rating_stats(movie_id, stats).await?;
        debug!(%movie_id, average = stats.average, count = stats.count, "rating aggregate refreshed");
        Ok(stats)
    }

    pub async fn list_for_movie(&self, movie_id: MovieID) -> Result<Vec<Rating>> {
        if self.uow.movies.get(movie_id).await?.is_none() {
            return Err(CatalogError::not_found("movie", movie_id));
        }
        self.uow.ratings.list_for_movie(movie_id).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};
    use marquee_model::{Movie, MovieStatus, User};

    use super::*;

    async fn seed(uow: &AppUnitOfWork, users: usize) -> (MovieID, Vec<UserID>) {
        let now = Utc::now();
        let movie = Movie {
            id: MovieID::new(),
            title: "Arrival".into(),
            description: String::new(),
            release_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() - Duration::days(1),
            duration: 116,
            poster: None,
            trailer_url: None,
            genres: Vec::new(),
            cast: Vec::new(),
            average_rating: 0.0,
            total_ratings: 0,
            status: MovieStatus::InTheaters,
            created_at: now,
            last_updated: now,
        };
        uow.movies.insert(&movie).await.unwrap();
        let mut ids = Vec::new();
        for n in 0..users {
            let user = User {
                id: UserID::new(),
                username: format!("user{n}"),
                email: None,
                created_at: now,
            };
            uow.users.insert(&user).await.unwrap();
            ids.push(user.id);
        }
        (movie.id, ids)
    }

    #[tokio::test]
    async fn delete_recomputes_from_remaining_ratings() {
        let uow = Arc::new(AppUnitOfWork::in_memory());
        let service = RatingService::new(uow.clone());
        let (movie_id, users) = seed(&uow, 3).await;

        service.submit(movie_id, users[0], 4).await.unwrap();
        service.submit(movie_id, users[1], 6).await.unwrap();
        let (eight, stats) = service.submit(movie_id, users[2], 8).await.unwrap();
        assert_eq!(stats, RatingStats { average: 6.0, count: 3 });

        let stats = service.delete(eight.id).await.unwrap();
        assert_eq!(stats, RatingStats { average: 5.0, count: 2 });

        let movie = uow.movies.get(movie_id).await.unwrap().unwrap();
        assert_eq!(movie.total_ratings, 2);
        assert_eq!(movie.average_rating, 5.0);
    }

    #[tokio::test]
    async fn out_of_range_value_never_reaches_storage() {
        let uow = Arc::new(AppUnitOfWork::in_memory());
        let service = RatingService::new(uow.clone());
        let (movie_id, users) = seed(&uow, 1).await;

        let err = service.submit(movie_id, users[0], 11).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        assert!(uow.ratings.values_for_movie(movie_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn resubmission_overwrites_previous_value() {
        let uow = Arc::new(AppUnitOfWork::in_memory());
        let service = RatingService::new(uow.clone());
        let (movie_id, users) = seed(&uow, 1).await;

        service.submit(movie_id, users[0], 2).await.unwrap();
        let (_, stats) = service.submit(movie_id, users[0], 9).await.unwrap();
        assert_eq!(stats, RatingStats { average: 9.0, count: 1 });
    }

    #[tokio::test]
    async fn recompute_is_idempotent() {
        let uow = Arc::new(AppUnitOfWork::in_memory());
        let service = RatingService::new(uow.clone());
        let (movie_id, users) = seed(&uow, 2).await;
        service.submit(movie_id, users[0], 3).await.unwrap();
        service.submit(movie_id, users[1], 7).await.unwrap();

        let first = service.recompute(movie_id).await.unwrap();
        let second = service.recompute(movie_id).await.unwrap();
        assert_eq!(first, second);
    }
}
