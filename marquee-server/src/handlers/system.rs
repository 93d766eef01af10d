use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::warn;

use crate::infra::app_state::AppState;

pub async fn ping_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Reports storage reachability; 503 when Postgres does not answer.
pub async fn health_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<Value>) {
    let database = match &state.postgres {
        Some(pg) => match pg.ping().await {
            Ok(()) => "ok",
            Err(err) => {
                warn!(error = %err, "health check: database unreachable");
                "unreachable"
            }
        },
        None => "in_memory",
    };
    let cache = if state.config().redis.is_some() {
        "redis"
    } else {
        "in_process"
    };

    let status = if database == "unreachable" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    let body = json!({
        "status": if status.is_success() { "healthy" } else { "degraded" },
        "database": database,
        "cache": cache,
        "dev_mode": state.config().dev_mode,
        "timestamp": Utc::now().to_rfc3339(),
    });
    (status, Json(body))
}
