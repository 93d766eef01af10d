use async_trait::async_trait;
use marquee_model::{
    Actor, ActorID, Cinema, CinemaID, Genre, GenreID, MovieID,
    MovieOnlineCinema, OnlineCinema, OnlineCinemaID, Showtime, ShowtimeID,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::super::{count_from, db_error, to_i64};
use crate::{
    database::ports::catalog::{
        ActorsRepository, CinemasRepository, GenresRepository,
        OnlineCinemasRepository, ShowtimeFilter, ShowtimesRepository,
    },
    error::{CatalogError, Result},
    query::PageWindow,
};

fn decode(err: sqlx::Error) -> CatalogError {
    CatalogError::Database(format!("Failed to decode catalog row: {err}"))
}

macro_rules! pg_repository {
    ($name:ident) => {
        #[derive(Clone, Debug)]
        pub struct $name {
            pool: PgPool,
        }

        impl $name {
            pub fn new(pool: PgPool) -> Self {
                Self { pool }
            }

            fn pool(&self) -> &PgPool {
                &self.pool
            }
        }
    };
}

pg_repository!(PostgresCinemasRepository);
pg_repository!(PostgresShowtimesRepository);
pg_repository!(PostgresActorsRepository);
pg_repository!(PostgresGenresRepository);
pg_repository!(PostgresOnlineCinemasRepository);

async fn count_table(pool: &PgPool, table: &'static str) -> Result<u64> {
    let count: i64 =
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .map_err(db_error("Failed to count catalog rows"))?;
    Ok(count_from(count))
}

fn cinema_from_row(row: &PgRow) -> Result<Cinema> {
    Ok(Cinema {
        id: CinemaID(row.try_get("id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        address: row.try_get("address").map_err(decode)?,
    })
}

#[async_trait]
impl CinemasRepository for PostgresCinemasRepository {
    async fn insert(&self, cinema: &Cinema) -> Result<()> {
        sqlx::query("INSERT INTO cinemas (id, name, address) VALUES ($1, $2, $3)")
            .bind(cinema.id.to_uuid())
            .bind(&cinema.name)
            .bind(&cinema.address)
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to create cinema"))?;
        Ok(())
    }

    async fn update(&self, cinema: &Cinema) -> Result<()> {
        let result =
            sqlx::query("UPDATE cinemas SET name = $2, address = $3 WHERE id = $1")
                .bind(cinema.id.to_uuid())
                .bind(&cinema.name)
                .bind(&cinema.address)
                .execute(self.pool())
                .await
                .map_err(db_error("Failed to update cinema"))?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found("cinema", cinema.id));
        }
        Ok(())
    }

    async fn delete(&self, id: CinemaID) -> Result<()> {
        let result = sqlx::query("DELETE FROM cinemas WHERE id = $1")
            .bind(id.to_uuid())
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to delete cinema"))?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found("cinema", id));
        }
        Ok(())
    }

    async fn get(&self, id: CinemaID) -> Result<Option<Cinema>> {
        let row = sqlx::query("SELECT id, name, address FROM cinemas WHERE id = $1")
            .bind(id.to_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to load cinema"))?;
        row.as_ref().map(cinema_from_row).transpose()
    }

    async fn count(&self) -> Result<u64> {
        count_table(self.pool(), "cinemas").await
    }

    async fn list(&self, window: PageWindow) -> Result<Vec<Cinema>> {
        let rows = sqlx::query(
            "SELECT id, name, address FROM cinemas ORDER BY name, id LIMIT $1 OFFSET $2",
        )
        .bind(to_i64(window.limit()))
        .bind(to_i64(window.offset()))
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list cinemas"))?;
        rows.iter().map(cinema_from_row).collect()
    }
}

fn showtime_from_row(row: &PgRow) -> Result<Showtime> {
    Ok(Showtime {
        id: ShowtimeID(row.try_get("id").map_err(decode)?),
        movie_id: MovieID(row.try_get("movie_id").map_err(decode)?),
        cinema_id: CinemaID(row.try_get("cinema_id").map_err(decode)?),
        start_time: row.try_get("start_time").map_err(decode)?,
        ticket_price: row.try_get("ticket_price").map_err(decode)?,
    })
}

const SHOWTIME_FILTER: &str = "($1::uuid IS NULL OR movie_id = $1) \
     AND ($2::uuid IS NULL OR cinema_id = $2)";

#[async_trait]
impl ShowtimesRepository for PostgresShowtimesRepository {
    async fn insert(&self, showtime: &Showtime) -> Result<()> {
        sqlx::query(
            "INSERT INTO showtimes (id, movie_id, cinema_id, start_time, ticket_price) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(showtime.id.to_uuid())
        .bind(showtime.movie_id.to_uuid())
        .bind(showtime.cinema_id.to_uuid())
        .bind(showtime.start_time)
        .bind(showtime.ticket_price)
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to create showtime"))?;
        Ok(())
    }

    async fn delete(&self, id: ShowtimeID) -> Result<()> {
        let result = sqlx::query("DELETE FROM showtimes WHERE id = $1")
            .bind(id.to_uuid())
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to delete showtime"))?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found("showtime", id));
        }
        Ok(())
    }

    async fn get(&self, id: ShowtimeID) -> Result<Option<Showtime>> {
        let row = sqlx::query(
            "SELECT id, movie_id, cinema_id, start_time, ticket_price \
             FROM showtimes WHERE id = $1",
        )
        .bind(id.to_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(db_error("Failed to load showtime"))?;
        row.as_ref().map(showtime_from_row).transpose()
    }

    async fn count(&self, filter: &ShowtimeFilter) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM showtimes WHERE {SHOWTIME_FILTER}"
        ))
        .bind(filter.movie_id.map(|id| id.to_uuid()))
        .bind(filter.cinema_id.map(|id| id.to_uuid()))
        .fetch_one(self.pool())
        .await
        .map_err(db_error("Failed to count showtimes"))?;
        Ok(count_from(count))
    }

    async fn list(
        &self,
        filter: &ShowtimeFilter,
        window: PageWindow,
    ) -> Result<Vec<Showtime>> {
        let rows = sqlx::query(&format!(
            "SELECT id, movie_id, cinema_id, start_time, ticket_price \
             FROM showtimes WHERE {SHOWTIME_FILTER} \
             ORDER BY start_time, id LIMIT $3 OFFSET $4"
        ))
        .bind(filter.movie_id.map(|id| id.to_uuid()))
        .bind(filter.cinema_id.map(|id| id.to_uuid()))
        .bind(to_i64(window.limit()))
        .bind(to_i64(window.offset()))
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list showtimes"))?;
        rows.iter().map(showtime_from_row).collect()
    }
}

fn actor_from_row(row: &PgRow) -> Result<Actor> {
    Ok(Actor {
        id: ActorID(row.try_get("id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        date_of_birth: row.try_get("date_of_birth").map_err(decode)?,
        biography: row.try_get("biography").map_err(decode)?,
    })
}

#[async_trait]
impl ActorsRepository for PostgresActorsRepository {
    async fn insert(&self, actor: &Actor) -> Result<()> {
        sqlx::query(
            "INSERT INTO actors (id, name, date_of_birth, biography) VALUES ($1, $2, $3, $4)",
        )
        .bind(actor.id.to_uuid())
        .bind(&actor.name)
        .bind(actor.date_of_birth)
        .bind(&actor.biography)
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to create actor"))?;
        Ok(())
    }

    async fn get(&self, id: ActorID) -> Result<Option<Actor>> {
        let row = sqlx::query(
            "SELECT id, name, date_of_birth, biography FROM actors WHERE id = $1",
        )
        .bind(id.to_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(db_error("Failed to load actor"))?;
        row.as_ref().map(actor_from_row).transpose()
    }

    async fn get_many(&self, ids: &[ActorID]) -> Result<Vec<Actor>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<Uuid> = ids.iter().map(ActorID::to_uuid).collect();
        let rows = sqlx::query(
            "SELECT id, name, date_of_birth, biography FROM actors WHERE id = ANY($1)",
        )
        .bind(raw.as_slice())
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to load actors"))?;
        rows.iter().map(actor_from_row).collect()
    }

    async fn count(&self) -> Result<u64> {
        count_table(self.pool(), "actors").await
    }

    async fn list(&self, window: PageWindow) -> Result<Vec<Actor>> {
        let rows = sqlx::query(
            "SELECT id, name, date_of_birth, biography FROM actors \
             ORDER BY name, id LIMIT $1 OFFSET $2",
        )
        .bind(to_i64(window.limit()))
        .bind(to_i64(window.offset()))
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list actors"))?;
        rows.iter().map(actor_from_row).collect()
    }
}

#[async_trait]
impl GenresRepository for PostgresGenresRepository {
    async fn insert(&self, genre: &Genre) -> Result<()> {
        sqlx::query("INSERT INTO genres (id, name) VALUES ($1, $2)")
            .bind(genre.id.to_uuid())
            .bind(&genre.name)
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to create genre"))?;
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        count_table(self.pool(), "genres").await
    }

    async fn list(&self, window: PageWindow) -> Result<Vec<Genre>> {
        let rows = sqlx::query(
            "SELECT id, name FROM genres ORDER BY name LIMIT $1 OFFSET $2",
        )
        .bind(to_i64(window.limit()))
        .bind(to_i64(window.offset()))
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list genres"))?;
        rows.iter()
            .map(|row| {
                Ok(Genre {
                    id: GenreID(row.try_get("id").map_err(decode)?),
                    name: row.try_get("name").map_err(decode)?,
                })
            })
            .collect()
    }

    async fn exists_all(&self, ids: &[GenreID]) -> Result<bool> {
        if ids.is_empty() {
            return Ok(true);
        }
        let raw: Vec<Uuid> = ids.iter().map(GenreID::to_uuid).collect();
        let found: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT id) FROM genres WHERE id = ANY($1)",
        )
        .bind(raw.as_slice())
        .fetch_one(self.pool())
        .await
        .map_err(db_error("Failed to check genres"))?;

        let mut unique = raw;
        unique.sort();
        unique.dedup();
        Ok(count_from(found) == unique.len() as u64)
    }
}

fn online_cinema_from_row(row: &PgRow) -> Result<OnlineCinema> {
    Ok(OnlineCinema {
        id: OnlineCinemaID(row.try_get("id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        url: row.try_get("url").map_err(decode)?,
    })
}

#[async_trait]
impl OnlineCinemasRepository for PostgresOnlineCinemasRepository {
    async fn insert(&self, cinema: &OnlineCinema) -> Result<()> {
        sqlx::query("INSERT INTO online_cinemas (id, name, url) VALUES ($1, $2, $3)")
            .bind(cinema.id.to_uuid())
            .bind(&cinema.name)
            .bind(&cinema.url)
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to create online cinema"))?;
        Ok(())
    }

    async fn get(&self, id: OnlineCinemaID) -> Result<Option<OnlineCinema>> {
        let row =
            sqlx::query("SELECT id, name, url FROM online_cinemas WHERE id = $1")
                .bind(id.to_uuid())
                .fetch_optional(self.pool())
                .await
                .map_err(db_error("Failed to load online cinema"))?;
        row.as_ref().map(online_cinema_from_row).transpose()
    }

    async fn count(&self) -> Result<u64> {
        count_table(self.pool(), "online_cinemas").await
    }

    async fn list(&self, window: PageWindow) -> Result<Vec<OnlineCinema>> {
        let rows = sqlx::query(
            "SELECT id, name, url FROM online_cinemas ORDER BY name, id LIMIT $1 OFFSET $2",
        )
        .bind(to_i64(window.limit()))
        .bind(to_i64(window.offset()))
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list online cinemas"))?;
        rows.iter().map(online_cinema_from_row).collect()
    }

    async fn link(&self, link: &MovieOnlineCinema) -> Result<()> {
        sqlx::query(
            "INSERT INTO movie_online_cinemas (id, movie_id, online_cinema_id) \
             VALUES ($1, $2, $3)",
        )
        .bind(link.id.to_uuid())
        .bind(link.movie_id.to_uuid())
        .bind(link.online_cinema_id.to_uuid())
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to link online cinema"))?;
        Ok(())
    }

    async fn list_for_movie(
        &self,
        movie_id: MovieID,
    ) -> Result<Vec<OnlineCinema>> {
        let rows = sqlx::query(
            "SELECT oc.id, oc.name, oc.url FROM online_cinemas oc \
             JOIN movie_online_cinemas l ON l.online_cinema_id = oc.id \
             WHERE l.movie_id = $1 ORDER BY oc.name",
        )
        .bind(movie_id.to_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list streaming platforms"))?;
        rows.iter().map(online_cinema_from_row).collect()
    }
}
