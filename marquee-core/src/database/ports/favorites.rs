use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_model::{Favorite, MovieID, UserID};

use crate::error::Result;
use crate::query::PageWindow;

#[async_trait]
pub trait FavoritesRepository: Send + Sync {
    /// Adding an existing pair returns the stored favorite unchanged.
    async fn add(
        &self,
        user_id: UserID,
        movie_id: MovieID,
        at: DateTime<Utc>,
    ) -> Result<Favorite>;

    /// Returns whether a favorite was removed.
    async fn remove(&self, user_id: UserID, movie_id: MovieID) -> Result<bool>;

    async fn count_for_user(&self, user_id: UserID) -> Result<u64>;

    /// Most recently added first.
    async fn list_for_user(
        &self,
        user_id: UserID,
        window: PageWindow,
    ) -> Result<Vec<Favorite>>;
}
