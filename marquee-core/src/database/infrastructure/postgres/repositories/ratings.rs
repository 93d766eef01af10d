use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_model::{MovieID, Rating, RatingID, RatingValue, UserID};
use sqlx::{PgPool, Row, postgres::PgRow};

use super::super::db_error;
use crate::{
    database::ports::ratings::RatingsRepository,
    error::{CatalogError, Result},
};

#[derive(Clone, Debug)]
pub struct PostgresRatingsRepository {
    pool: PgPool,
}

impl PostgresRatingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn decode(err: sqlx::Error) -> CatalogError {
    CatalogError::Database(format!("Failed to decode rating row: {err}"))
}

fn value_from(raw: i16) -> Result<RatingValue> {
    RatingValue::new(i64::from(raw)).map_err(|e| {
        CatalogError::Database(format!("Stored rating is invalid: {e}"))
    })
}

fn rating_from_row(row: &PgRow) -> Result<Rating> {
    Ok(Rating {
        id: RatingID(row.try_get("id").map_err(decode)?),
        movie_id: MovieID(row.try_get("movie_id").map_err(decode)?),
        user_id: UserID(row.try_get("user_id").map_err(decode)?),
        value: value_from(row.try_get("value").map_err(decode)?)?,
        created_at: row.try_get("created_at").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
    })
}

#[async_trait]
impl RatingsRepository for PostgresRatingsRepository {
    async fn upsert(
        &self,
        movie_id: MovieID,
        user_id: UserID,
        value: RatingValue,
        at: DateTime<Utc>,
    ) -> Result<Rating> {
        let row = sqlx::query(
            r#"
            INSERT INTO ratings (id, movie_id, user_id, value, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (movie_id, user_id) DO UPDATE SET
                value = EXCLUDED.value,
                updated_at = EXCLUDED.updated_at
            RETURNING id, movie_id, user_id, value, created_at, updated_at
            "#,
        )
        .bind(RatingID::new().to_uuid())
        .bind(movie_id.to_uuid())
        .bind(user_id.to_uuid())
        .bind(i16::from(value.get()))
        .bind(at)
        .fetch_one(self.pool())
        .await
        .map_err(db_error("Failed to store rating"))?;

        rating_from_row(&row)
    }

    async fn get(&self, id: RatingID) -> Result<Option<Rating>> {
        let row = sqlx::query(
            "SELECT id, movie_id, user_id, value, created_at, updated_at \
             FROM ratings WHERE id = $1",
        )
        .bind(id.to_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(db_error("Failed to load rating"))?;

        row.as_ref().map(rating_from_row).transpose()
    }

    async fn delete(&self, id: RatingID) -> Result<Option<Rating>> {
        let row = sqlx::query(
            "DELETE FROM ratings WHERE id = $1 \
             RETURNING id, movie_id, user_id, value, created_at, updated_at",
        )
        .bind(id.to_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(db_error("Failed to delete rating"))?;

        row.as_ref().map(rating_from_row).transpose()
    }

    async fn list_for_movie(&self, movie_id: MovieID) -> Result<Vec<Rating>> {
        let rows = sqlx::query(
            "SELECT id, movie_id, user_id, value, created_at, updated_at \
             FROM ratings WHERE movie_id = $1 ORDER BY updated_at DESC",
        )
        .bind(movie_id.to_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list ratings"))?;

        rows.iter().map(rating_from_row).collect()
    }

    async fn values_for_movie(
        &self,
        movie_id: MovieID,
    ) -> Result<Vec<RatingValue>> {
        let values: Vec<i16> =
            sqlx::query_scalar("SELECT value FROM ratings WHERE movie_id = $1")
                .bind(movie_id.to_uuid())
                .fetch_all(self.pool())
                .await
                .map_err(db_error("Failed to load rating values"))?;

        values.into_iter().map(value_from).collect()
    }
}
