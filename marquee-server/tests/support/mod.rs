use axum_test::TestServer;
use chrono::{Duration, NaiveDate, Utc};
use marquee_server::{AppState, infra::config::Config, routes::create_app};
use serde_json::{Value, json};

/// Server over the in-memory store and cache with sweeps disabled.
pub fn build_test_server() -> (TestServer, AppState) {
    let state = AppState::in_memory(Config::dev());
    let server = TestServer::new(create_app(state.clone())).expect("test server");
    (server, state)
}

pub fn days_ago(days: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(days)
}

pub fn movie_body(title: &str, release: NaiveDate) -> Value {
    json!({
        "title": title,
        "description": "",
        "release_date": release.to_string(),
        "duration": 120,
    })
}

pub async fn create_user(server: &TestServer, username: &str) -> String {
    let response = server
        .post(marquee_core::api::routes::v1::users::COLLECTION)
        .json(&json!({ "username": username, "email": format!("{username}@example.com") }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["id"]
        .as_str()
        .expect("user id")
        .to_string()
}

pub async fn create_movie(server: &TestServer, title: &str, release: NaiveDate) -> Value {
    let response = server
        .post(marquee_core::api::routes::v1::movies::COLLECTION)
        .json(&movie_body(title, release))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}
