use std::collections::HashMap;

use async_trait::async_trait;
use marquee_model::{
    CastMember, GenreID, Movie, MovieID, MovieStatus, RatingStats,
};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use super::super::{count_from, db_error, to_i64};
use crate::{
    database::ports::movies::{MovieFilter, MoviesRepository},
    error::{CatalogError, Result},
    query::PageWindow,
};

const MOVIE_COLUMNS: &str = "id, title, description, release_date, duration, \
     poster, trailer_url, average_rating, total_ratings, status, created_at, \
     last_updated";

const FILTER_CLAUSE: &str = "($1::text IS NULL OR m.status = $1) \
     AND ($2::uuid IS NULL OR EXISTS (\
         SELECT 1 FROM movie_genres g WHERE g.movie_id = m.id AND g.genre_id = $2))";

#[derive(Clone, Debug)]
pub struct PostgresMoviesRepository {
    pool: PgPool,
}

impl PostgresMoviesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn hydrate(&self, rows: Vec<PgRow>) -> Result<Vec<Movie>> {
        let mut movies = rows
            .iter()
            .map(movie_from_row)
            .collect::<Result<Vec<_>>>()?;
        if movies.is_empty() {
            return Ok(movies);
        }

        let ids: Vec<Uuid> = movies.iter().map(|m| m.id.to_uuid()).collect();

        let genre_rows = sqlx::query(
            "SELECT movie_id, genre_id FROM movie_genres \
             WHERE movie_id = ANY($1) ORDER BY genre_id",
        )
        .bind(ids.as_slice())
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to load movie genres"))?;

        let mut genres: HashMap<Uuid, Vec<GenreID>> = HashMap::new();
        for row in &genre_rows {
            let movie_id: Uuid = row.try_get("movie_id").map_err(decode)?;
            let genre_id: Uuid = row.try_get("genre_id").map_err(decode)?;
            genres.entry(movie_id).or_default().push(GenreID(genre_id));
        }

        let cast_rows = sqlx::query(
            "SELECT movie_id, actor_id, role, is_main_role FROM movie_cast \
             WHERE movie_id = ANY($1) ORDER BY position",
        )
        .bind(ids.as_slice())
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to load movie cast"))?;

        let mut cast: HashMap<Uuid, Vec<CastMember>> = HashMap::new();
        for row in &cast_rows {
            let movie_id: Uuid = row.try_get("movie_id").map_err(decode)?;
            cast.entry(movie_id).or_default().push(CastMember {
                actor_id: row.try_get::<Uuid, _>("actor_id").map_err(decode)?.into(),
                role: row.try_get("role").map_err(decode)?,
                is_main_role: row.try_get("is_main_role").map_err(decode)?,
            });
        }

        for movie in &mut movies {
            let key = movie.id.to_uuid();
            movie.genres = genres.remove(&key).unwrap_or_default();
            movie.cast = cast.remove(&key).unwrap_or_default();
        }
        Ok(movies)
    }

    async fn write_relations(
        tx: &mut Transaction<'_, Postgres>,
        movie: &Movie,
    ) -> Result<()> {
        let id = movie.id.to_uuid();

        sqlx::query("DELETE FROM movie_genres WHERE movie_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to clear movie genres"))?;
        for genre in &movie.genres {
            sqlx::query(
                "INSERT INTO movie_genres (movie_id, genre_id) VALUES ($1, $2)",
            )
            .bind(id)
            .bind(genre.to_uuid())
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to attach genre"))?;
        }

        sqlx::query("DELETE FROM movie_cast WHERE movie_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to clear movie cast"))?;
        for (position, member) in movie.cast.iter().enumerate() {
            sqlx::query(
                "INSERT INTO movie_cast (movie_id, actor_id, role, is_main_role, position) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(id)
            .bind(member.actor_id.to_uuid())
            .bind(&member.role)
            .bind(member.is_main_role)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to attach cast member"))?;
        }
        Ok(())
    }
}

fn decode(err: sqlx::Error) -> CatalogError {
    CatalogError::Database(format!("Failed to decode movie row: {err}"))
}

fn movie_from_row(row: &PgRow) -> Result<Movie> {
    let status: String = row.try_get("status").map_err(decode)?;
    let status = status.parse::<MovieStatus>().map_err(|e| {
        CatalogError::Database(format!("Stored movie status is invalid: {e}"))
    })?;
    let duration: i32 = row.try_get("duration").map_err(decode)?;
    let total_ratings: i32 = row.try_get("total_ratings").map_err(decode)?;

    Ok(Movie {
        id: MovieID(row.try_get("id").map_err(decode)?),
        title: row.try_get("title").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        release_date: row.try_get("release_date").map_err(decode)?,
        duration: u32::try_from(duration).unwrap_or_default(),
        poster: row.try_get("poster").map_err(decode)?,
        trailer_url: row.try_get("trailer_url").map_err(decode)?,
        genres: Vec::new(),
        cast: Vec::new(),
        average_rating: row.try_get("average_rating").map_err(decode)?,
        total_ratings: u32::try_from(total_ratings).unwrap_or_default(),
        status,
        created_at: row.try_get("created_at").map_err(decode)?,
        last_updated: row.try_get("last_updated").map_err(decode)?,
    })
}

fn duration_param(movie: &Movie) -> Result<i32> {
    i32::try_from(movie.duration).map_err(|_| {
        CatalogError::Validation(format!(
            "duration: must be at most {} minutes",
            Movie::MAX_DURATION
        ))
    })
}

#[async_trait]
impl MoviesRepository for PostgresMoviesRepository {
    async fn insert(&self, movie: &Movie) -> Result<()> {
        let mut tx = self.pool().begin().await.map_err(db_error(
            "Failed to start transaction",
        ))?;

        sqlx::query(
            r#"
            INSERT INTO movies (
                id, title, description, release_date, duration, poster,
                trailer_url, average_rating, total_ratings, status,
                created_at, last_updated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(movie.id.to_uuid())
        .bind(&movie.title)
        .bind(&movie.description)
        .bind(movie.release_date)
        .bind(duration_param(movie)?)
        .bind(&movie.poster)
        .bind(&movie.trailer_url)
        .bind(movie.average_rating)
        .bind(i32::try_from(movie.total_ratings).unwrap_or(i32::MAX))
        .bind(movie.status.as_str())
        .bind(movie.created_at)
        .bind(movie.last_updated)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to insert movie"))?;

        Self::write_relations(&mut tx, movie).await?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit movie insert"))
    }

    async fn update(&self, movie: &Movie) -> Result<()> {
        let mut tx = self.pool().begin().await.map_err(db_error(
            "Failed to start transaction",
        ))?;

        let result = sqlx::query(
            r#"
            UPDATE movies SET
                title = $2,
                description = $3,
                release_date = $4,
                duration = $5,
                poster = $6,
                trailer_url = $7,
                status = $8,
                last_updated = $9
            WHERE id = $1
            "#,
        )
        .bind(movie.id.to_uuid())
        .bind(&movie.title)
        .bind(&movie.description)
        .bind(movie.release_date)
        .bind(duration_param(movie)?)
        .bind(&movie.poster)
        .bind(&movie.trailer_url)
        .bind(movie.status.as_str())
        .bind(movie.last_updated)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to update movie"))?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found("movie", movie.id));
        }

        Self::write_relations(&mut tx, movie).await?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit movie update"))
    }

    async fn delete(&self, id: MovieID) -> Result<()> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id.to_uuid())
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to delete movie"))?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found("movie", id));
        }
        Ok(())
    }

    async fn get(&self, id: MovieID) -> Result<Option<Movie>> {
        let row = sqlx::query(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1"
        ))
        .bind(id.to_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(db_error("Failed to load movie"))?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn count(&self, filter: &MovieFilter) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM movies m WHERE {FILTER_CLAUSE}"
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.genre.map(|g| g.to_uuid()))
        .fetch_one(self.pool())
        .await
        .map_err(db_error("Failed to count movies"))?;
        Ok(count_from(count))
    }

    async fn list(
        &self,
        filter: &MovieFilter,
        window: PageWindow,
    ) -> Result<Vec<Movie>> {
        let rows = sqlx::query(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies m WHERE {FILTER_CLAUSE} \
             ORDER BY m.release_date DESC, m.id LIMIT $3 OFFSET $4"
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.genre.map(|g| g.to_uuid()))
        .bind(to_i64(window.limit()))
        .bind(to_i64(window.offset()))
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list movies"))?;

        self.hydrate(rows).await
    }

    async fn list_ids(&self) -> Result<Vec<MovieID>> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM movies ORDER BY id")
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list movie ids"))?;
        Ok(ids.into_iter().map(MovieID).collect())
    }

    async fn update_status(
        &self,
        id: MovieID,
        status: MovieStatus,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE movies SET status = $2, last_updated = NOW() WHERE id = $1",
        )
        .bind(id.to_uuid())
        .bind(status.as_str())
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to update movie status"))?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found("movie", id));
        }
        Ok(())
    }

    async fn update_rating_stats(
        &self,
        id: MovieID,
        stats: RatingStats,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE movies SET average_rating = $2, total_ratings = $3 WHERE id = $1",
        )
        .bind(id.to_uuid())
        .bind(stats.average)
        .bind(i32::try_from(stats.count).unwrap_or(i32::MAX))
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to update rating stats"))?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found("movie", id));
        }
        Ok(())
    }

    async fn trending(&self, limit: u32) -> Result<Vec<Movie>> {
        let rows = sqlx::query(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies \
             WHERE status = $1 AND total_ratings > 0 \
             ORDER BY average_rating DESC, total_ratings DESC, id LIMIT $2"
        ))
        .bind(MovieStatus::InTheaters.as_str())
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to load trending movies"))?;

        self.hydrate(rows).await
    }
}
