pub mod v1;

use axum::{Router, http::HeaderValue, middleware, routing::get};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{
    AppState,
    handlers::system::{health_handler, ping_handler},
    infra::{config::CorsConfig, middleware::record_visit},
};

/// Create the main API router with all versions
pub fn create_api_router(state: AppState) -> Router<AppState> {
    Router::new().nest("/api/v1", v1::create_v1_router(state))
}

/// Complete application: versioned API, root probes and the HTTP layers.
pub fn create_app(state: AppState) -> Router {
    let cors_layer = cors_layer(&state.config().cors);

    Router::new()
        .route("/ping", get(ping_handler))
        .route("/health", get(health_handler))
        .merge(create_api_router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

/// Visit recording applies to the versioned API only.
pub(crate) fn with_visit_recording(
    router: Router<AppState>,
    state: AppState,
) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, record_visit))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode, header},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::infra::config::Config;

    #[tokio::test]
    async fn root_ping_answers() {
        let app = create_app(AppState::in_memory(Config::dev()));
        let response = app
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn configured_origins_are_echoed_on_preflight() {
        let mut config = Config::dev();
        config.cors.allowed_origins = vec!["https://marquee.example".into()];
        let app = create_app(AppState::in_memory(config));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/v1/movies")
                    .header(header::ORIGIN, "https://marquee.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://marquee.example"
        );
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let app = create_app(AppState::in_memory(Config::dev()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/nowhere")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
