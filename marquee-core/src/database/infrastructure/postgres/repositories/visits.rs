use async_trait::async_trait;
use marquee_model::{UserID, UserVisit, VisitID};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::super::{count_from, db_error, to_i64};
use crate::{
    database::ports::visits::VisitsRepository,
    error::{CatalogError, Result},
    query::PageWindow,
};

#[derive(Clone, Debug)]
pub struct PostgresVisitsRepository {
    pool: PgPool,
}

impl PostgresVisitsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn visit_from_row(row: &PgRow) -> Result<UserVisit> {
    let decode = |e: sqlx::Error| {
        CatalogError::Database(format!("Failed to decode visit row: {e}"))
    };
    let user_id: Option<Uuid> = row.try_get("user_id").map_err(decode)?;
    Ok(UserVisit {
        id: VisitID(row.try_get("id").map_err(decode)?),
        user_id: user_id.map(UserID),
        path: row.try_get("path").map_err(decode)?,
        method: row.try_get("method").map_err(decode)?,
        ip_address: row.try_get("ip_address").map_err(decode)?,
        user_agent: row.try_get("user_agent").map_err(decode)?,
        visited_at: row.try_get("visited_at").map_err(decode)?,
    })
}

#[async_trait]
impl VisitsRepository for PostgresVisitsRepository {
    async fn record(&self, visit: &UserVisit) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_visits (id, user_id, path, method, ip_address, user_agent, visited_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(visit.id.to_uuid())
        .bind(visit.user_id.map(|id| id.to_uuid()))
        .bind(&visit.path)
        .bind(&visit.method)
        .bind(&visit.ip_address)
        .bind(&visit.user_agent)
        .bind(visit.visited_at)
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to record visit"))?;
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_visits")
            .fetch_one(self.pool())
            .await
            .map_err(db_error("Failed to count visits"))?;
        Ok(count_from(count))
    }

    async fn list(&self, window: PageWindow) -> Result<Vec<UserVisit>> {
        let rows = sqlx::query(
            "SELECT id, user_id, path, method, ip_address, user_agent, visited_at \
             FROM user_visits ORDER BY visited_at DESC, id DESC LIMIT $1 OFFSET $2",
        )
        .bind(to_i64(window.limit()))
        .bind(to_i64(window.offset()))
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list visits"))?;
        rows.iter().map(visit_from_row).collect()
    }
}
