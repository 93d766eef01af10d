//! PostgreSQL infrastructure adapters implementing the database ports.

pub mod repositories;

use std::{fmt, time::Duration};

use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use crate::error::{CatalogError, Result};

pub use repositories::catalog::{
    PostgresActorsRepository, PostgresCinemasRepository,
    PostgresGenresRepository, PostgresOnlineCinemasRepository,
    PostgresShowtimesRepository,
};
pub use repositories::favorites::PostgresFavoritesRepository;
pub use repositories::movies::PostgresMoviesRepository;
pub use repositories::ratings::PostgresRatingsRepository;
pub use repositories::users::PostgresUsersRepository;
pub use repositories::visits::PostgresVisitsRepository;

#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
    max_connections: u32,
}

impl fmt::Debug for PostgresDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDatabase")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl PostgresDatabase {
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(10);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(connection_string)
            .await
            .map_err(|e| {
                CatalogError::Database(format!(
                    "Database connection failed: {e}"
                ))
            })?;

        info!(max_connections, "Database pool initialized");

        Ok(Self {
            pool,
            max_connections,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        crate::MIGRATOR.run(&self.pool).await.map_err(|e| {
            CatalogError::Database(format!("Failed to run migrations: {e}"))
        })?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| {
                CatalogError::Database(format!("Database ping failed: {e}"))
            })
    }
}

/// Maps driver errors onto catalog errors, surfacing constraint violations as
/// conflicts or missing references.
pub(crate) fn db_error(
    context: &'static str,
) -> impl FnOnce(sqlx::Error) -> CatalogError {
    move |err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            CatalogError::Conflict(format!("{context}: {}", db.message()))
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            CatalogError::NotFound(format!(
                "{context}: referenced record does not exist"
            ))
        }
        sqlx::Error::Database(db) if db.is_check_violation() => {
            CatalogError::Validation(format!("{context}: {}", db.message()))
        }
        _ => CatalogError::Database(format!("{context}: {err}")),
    }
}

pub(crate) fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

pub(crate) fn count_from(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}
