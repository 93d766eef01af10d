use async_trait::async_trait;
use marquee_model::{User, UserID};
use sqlx::{PgPool, Row, postgres::PgRow};

use super::super::{count_from, db_error, to_i64};
use crate::{
    database::ports::users::UsersRepository,
    error::{CatalogError, Result},
    query::PageWindow,
};

#[derive(Clone, Debug)]
pub struct PostgresUsersRepository {
    pool: PgPool,
}

impl PostgresUsersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn user_from_row(row: &PgRow) -> Result<User> {
    let decode = |e: sqlx::Error| {
        CatalogError::Database(format!("Failed to decode user row: {e}"))
    };
    Ok(User {
        id: UserID(row.try_get("id").map_err(decode)?),
        username: row.try_get("username").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}

#[async_trait]
impl UsersRepository for PostgresUsersRepository {
    async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, email, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(user.id.to_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.created_at)
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to create user"))?;
        Ok(())
    }

    async fn get(&self, id: UserID) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, email, created_at FROM users WHERE id = $1",
        )
        .bind(id.to_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(db_error("Failed to load user"))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await
            .map_err(db_error("Failed to count users"))?;
        Ok(count_from(count))
    }

    async fn list(&self, window: PageWindow) -> Result<Vec<User>> {
        let rows = sqlx::query(
            "SELECT id, username, email, created_at FROM users \
             ORDER BY username LIMIT $1 OFFSET $2",
        )
        .bind(to_i64(window.limit()))
        .bind(to_i64(window.offset()))
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list users"))?;
        rows.iter().map(user_from_row).collect()
    }

    async fn list_notifiable(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(
            "SELECT id, username, email, created_at FROM users \
             WHERE email IS NOT NULL AND email <> '' ORDER BY username",
        )
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list notifiable users"))?;
        rows.iter().map(user_from_row).collect()
    }
}
