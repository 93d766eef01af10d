use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_model::{Favorite, FavoriteID, MovieID, UserID};
use sqlx::{PgPool, Row, postgres::PgRow};

use super::super::{count_from, db_error, to_i64};
use crate::{
    database::ports::favorites::FavoritesRepository,
    error::{CatalogError, Result},
    query::PageWindow,
};

#[derive(Clone, Debug)]
pub struct PostgresFavoritesRepository {
    pool: PgPool,
}

impl PostgresFavoritesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn favorite_from_row(row: &PgRow) -> Result<Favorite> {
    let decode = |e: sqlx::Error| {
        CatalogError::Database(format!("Failed to decode favorite row: {e}"))
    };
    Ok(Favorite {
        id: FavoriteID(row.try_get("id").map_err(decode)?),
        user_id: UserID(row.try_get("user_id").map_err(decode)?),
        movie_id: MovieID(row.try_get("movie_id").map_err(decode)?),
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}

#[async_trait]
impl FavoritesRepository for PostgresFavoritesRepository {
    async fn add(
        &self,
        user_id: UserID,
        movie_id: MovieID,
        at: DateTime<Utc>,
    ) -> Result<Favorite> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let row = sqlx::query(
            r#"
            INSERT INTO favorites (id, user_id, movie_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, movie_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id, user_id, movie_id, created_at
            "#,
        )
        .bind(FavoriteID::new().to_uuid())
        .bind(user_id.to_uuid())
        .bind(movie_id.to_uuid())
        .bind(at)
        .fetch_one(self.pool())
        .await
        .map_err(db_error("Failed to add favorite"))?;

        favorite_from_row(&row)
    }

    async fn remove(&self, user_id: UserID, movie_id: MovieID) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM favorites WHERE user_id = $1 AND movie_id = $2",
        )
        .bind(user_id.to_uuid())
        .bind(movie_id.to_uuid())
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to remove favorite"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_for_user(&self, user_id: UserID) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE user_id = $1")
                .bind(user_id.to_uuid())
                .fetch_one(self.pool())
                .await
                .map_err(db_error("Failed to count favorites"))?;
        Ok(count_from(count))
    }

    async fn list_for_user(
        &self,
        user_id: UserID,
        window: PageWindow,
    ) -> Result<Vec<Favorite>> {
        let rows = sqlx::query(
            "SELECT id, user_id, movie_id, created_at FROM favorites \
             WHERE user_id = $1 ORDER BY created_at DESC, id LIMIT $2 OFFSET $3",
        )
        .bind(user_id.to_uuid())
        .bind(to_i64(window.limit()))
        .bind(to_i64(window.offset()))
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list favorites"))?;
        rows.iter().map(favorite_from_row).collect()
    }
}
