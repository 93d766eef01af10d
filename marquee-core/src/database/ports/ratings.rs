use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_model::{MovieID, Rating, RatingID, RatingValue, UserID};

use crate::error::Result;

#[async_trait]
pub trait RatingsRepository: Send + Sync {
    /// Inserts the (movie, user) rating or overwrites its value.
    async fn upsert(
        &self,
        movie_id: MovieID,
        user_id: UserID,
        value: RatingValue,
        at: DateTime<Utc>,
    ) -> Result<Rating>;

    async fn get(&self, id: RatingID) -> Result<Option<Rating>>;

    /// Returns the removed rating, if any.
    async fn delete(&self, id: RatingID) -> Result<Option<Rating>>;

    async fn list_for_movie(&self, movie_id: MovieID) -> Result<Vec<Rating>>;

    async fn values_for_movie(
        &self,
        movie_id: MovieID,
    ) -> Result<Vec<RatingValue>>;
}
