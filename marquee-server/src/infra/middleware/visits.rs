//! Per-request audit trail.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, OriginalUri, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use marquee_model::UserID;
use tracing::warn;

use crate::infra::app_state::AppState;

/// Optional caller identity; there is no authentication layer.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Stores a visit row for every API request. A failed write is logged and
/// never fails the request.
pub async fn record_visit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let headers = request.headers();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| raw.parse::<UserID>().ok());
    let ip_address = client_ip(headers, peer);
    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    // Nested routers see a stripped URI; record what the client asked for.
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| request.uri().path(), |OriginalUri(uri)| uri.path())
        .to_string();
    let method = request.method().as_str().to_string();

    if let Err(err) = state
        .catalog
        .record_visit(user_id, path.clone(), method, ip_address, user_agent)
        .await
    {
        warn!(%path, error = %err, "failed to record visit");
    }

    next.run(request).await
}

/// First `X-Forwarded-For` hop, else the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(String::from)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}
