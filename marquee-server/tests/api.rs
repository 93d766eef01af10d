use axum::http::StatusCode;
use marquee_core::api::routes::{utils::replace_param, v1};
use serde_json::{Value, json};
use uuid::Uuid;

#[path = "support/mod.rs"]
mod support;

use support::{build_test_server, create_movie, create_user, days_ago};

#[tokio::test]
async fn rating_flow_updates_status_and_aggregate() {
    let (server, _state) = build_test_server();
    let first = create_user(&server, "alice").await;
    let second = create_user(&server, "bob").await;
    let movie = create_movie(&server, "Heat Wave", days_ago(10)).await;
    let movie_id = movie["id"].as_str().unwrap();
    assert_eq!(movie["status"], "in_theaters");

    let ratings_path = replace_param(v1::movies::RATINGS, "{id}", movie_id);
    for (user, score) in [(&first, 3), (&second, 7)] {
        server
            .post(&ratings_path)
            .json(&json!({ "user_id": user, "rating": score }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let detail = server
        .get(&replace_param(v1::movies::ITEM, "{id}", movie_id))
        .await;
    detail.assert_status_ok();
    let body: Value = detail.json();
    assert_eq!(body["status"], "in_theaters");
    assert_eq!(body["average_rating"], 5.0);
    assert_eq!(body["total_ratings"], 2);

    let ratings: Value = server.get(&ratings_path).await.json();
    assert_eq!(ratings["ratings"].as_array().unwrap().len(), 2);
    assert_eq!(ratings["average_rating"], 5.0);
}

#[tokio::test]
async fn deleting_a_rating_recomputes_the_aggregate() {
    let (server, _state) = build_test_server();
    let movie = create_movie(&server, "Arrival", days_ago(3)).await;
    let movie_id = movie["id"].as_str().unwrap();
    let ratings_path = replace_param(v1::movies::RATINGS, "{id}", movie_id);

    let mut rating_ids = Vec::new();
    for (name, score) in [("u4", 4), ("u6", 6), ("u8", 8)] {
        let user = create_user(&server, name).await;
        let accepted: Value = server
            .post(&ratings_path)
            .json(&json!({ "user_id": user, "rating": score }))
            .await
            .json();
        rating_ids.push(accepted["rating"]["id"].as_str().unwrap().to_string());
    }

    let response = server
        .delete(&replace_param(v1::ratings::ITEM, "{id}", &rating_ids[2]))
        .await;
    response.assert_status_ok();
    let stats: Value = response.json();
    assert_eq!(stats["average"], 5.0);
    assert_eq!(stats["count"], 2);
}

#[tokio::test]
async fn out_of_range_rating_is_rejected() {
    let (server, _state) = build_test_server();
    let user = create_user(&server, "carol").await;
    let movie = create_movie(&server, "Solaris", days_ago(1)).await;
    let path = replace_param(v1::movies::RATINGS, "{id}", movie["id"].as_str().unwrap());

    let response = server
        .post(&path)
        .json(&json!({ "user_id": user, "rating": 11 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["status"], 400);

    let ratings: Value = server.get(&path).await.json();
    assert_eq!(ratings["total_ratings"], 0);
}

#[tokio::test]
async fn page_numbers_are_clamped() {
    let (server, _state) = build_test_server();
    for i in 0..25 {
        create_movie(&server, &format!("Movie {i:02}"), days_ago(i)).await;
    }

    let last: Value = server
        .get(v1::movies::COLLECTION)
        .add_query_param("page", "9999")
        .await
        .json();
    assert_eq!(last["page"], 3);
    assert_eq!(last["total_pages"], 3);
    assert_eq!(last["count"], 25);
    assert_eq!(last["results"].as_array().unwrap().len(), 5);

    let first: Value = server
        .get(v1::movies::COLLECTION)
        .add_query_param("page", "abc")
        .await
        .json();
    assert_eq!(first["page"], 1);
    assert_eq!(first["results"].as_array().unwrap().len(), 10);

    let second: Value = server
        .get(v1::movies::COLLECTION)
        .add_query_param("page", "2")
        .await
        .json();
    assert_eq!(second["page"], 2);
}

#[tokio::test]
async fn listing_is_stale_within_cache_ttl() {
    let (server, _state) = build_test_server();
    create_movie(&server, "First Light", days_ago(2)).await;

    let before: Value = server.get(v1::movies::COLLECTION).await.json();
    assert_eq!(before["count"], 1);

    create_movie(&server, "Second Light", days_ago(1)).await;

    let cached: Value = server.get(v1::movies::COLLECTION).await.json();
    assert_eq!(cached["count"], 1);

    // A different parameter set is a different cache entry.
    let fresh: Value = server
        .get(v1::movies::COLLECTION)
        .add_query_param("page_size", "20")
        .await
        .json();
    assert_eq!(fresh["count"], 2);
}

#[tokio::test]
async fn filter_requires_a_known_status() {
    let (server, _state) = build_test_server();
    create_movie(&server, "Tomorrowland", days_ago(-30)).await;
    create_movie(&server, "Yesterday", days_ago(200)).await;

    server
        .get(v1::movies::FILTER)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get(v1::movies::FILTER)
        .add_query_param("status", "archived")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let upcoming: Value = server
        .get(v1::movies::FILTER)
        .add_query_param("status", "soon")
        .await
        .json();
    assert_eq!(upcoming["count"], 1);
    assert_eq!(upcoming["results"][0]["title"], "Tomorrowland");

    let ended: Value = server
        .get(v1::movies::FILTER)
        .add_query_param("status", "ended")
        .await
        .json();
    assert_eq!(ended["results"][0]["title"], "Yesterday");
}

#[tokio::test]
async fn trending_lists_rated_movies_in_theaters() {
    let (server, _state) = build_test_server();
    let user = create_user(&server, "dave").await;
    let low = create_movie(&server, "Low Score", days_ago(5)).await;
    let high = create_movie(&server, "High Score", days_ago(5)).await;
    create_movie(&server, "Unrated", days_ago(5)).await;

    for (movie, score) in [(&low, 2), (&high, 9)] {
        let path = replace_param(v1::movies::RATINGS, "{id}", movie["id"].as_str().unwrap());
        server
            .post(&path)
            .json(&json!({ "user_id": user, "rating": score }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let trending: Value = server.get(v1::movies::TRENDING).await.json();
    let titles: Vec<&str> = trending
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["High Score", "Low Score"]);
}

#[tokio::test]
async fn unknown_records_are_not_found() {
    let (server, _state) = build_test_server();
    let missing = Uuid::now_v7().to_string();

    let response = server
        .get(&replace_param(v1::movies::ITEM, "{id}", &missing))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["status"], 404);

    server
        .get(&replace_param(v1::cinemas::ITEM, "{id}", &missing))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .delete(&replace_param(v1::ratings::ITEM, "{id}", &missing))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() {
    let (server, _state) = build_test_server();
    server
        .get(&replace_param(v1::movies::ITEM, "{id}", "not-a-uuid"))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_usernames_conflict() {
    let (server, _state) = build_test_server();
    create_user(&server, "erin").await;

    let response = server
        .post(v1::users::COLLECTION)
        .json(&json!({ "username": "erin" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn cast_is_listed_main_roles_first() {
    let (server, _state) = build_test_server();
    let mut actor_ids = Vec::new();
    for name in ["Supporting Player", "Lead Player"] {
        let actor: Value = server
            .post(v1::actors::COLLECTION)
            .json(&json!({ "name": name }))
            .await
            .json();
        actor_ids.push(actor["id"].as_str().unwrap().to_string());
    }

    let mut body = support::movie_body("Ensemble", days_ago(4));
    body["cast"] = json!([
        { "actor_id": actor_ids[0], "role": "Sidekick", "is_main_role": false },
        { "actor_id": actor_ids[1], "role": "Hero", "is_main_role": true },
    ]);
    let movie: Value = server.post(v1::movies::COLLECTION).json(&body).await.json();

    let cast: Value = server
        .get(&replace_param(v1::movies::ACTORS, "{id}", movie["id"].as_str().unwrap()))
        .await
        .json();
    assert_eq!(cast[0]["name"], "Lead Player");
    assert_eq!(cast[0]["role"], "Hero");
    assert_eq!(cast[1]["is_main_role"], false);
}

#[tokio::test]
async fn favorites_can_be_added_listed_and_removed() {
    let (server, _state) = build_test_server();
    let user = create_user(&server, "frank").await;
    let movie = create_movie(&server, "Keeper", days_ago(6)).await;
    let favorite_path =
        replace_param(v1::movies::FAVORITE, "{id}", movie["id"].as_str().unwrap());

    server
        .post(&favorite_path)
        .json(&json!({ "user_id": user }))
        .await
        .assert_status(StatusCode::CREATED);

    let favorites: Value = server
        .get(&replace_param(v1::users::FAVORITES, "{id}", &user))
        .await
        .json();
    assert_eq!(favorites["count"], 1);
    assert_eq!(favorites["results"][0]["movie_id"], movie["id"]);

    server
        .delete(&favorite_path)
        .json(&json!({ "user_id": user }))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .delete(&favorite_path)
        .json(&json!({ "user_id": user }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn showtimes_validate_price_and_references() {
    let (server, _state) = build_test_server();
    let movie = create_movie(&server, "Matinee", days_ago(2)).await;
    let cinema: Value = server
        .post(v1::cinemas::COLLECTION)
        .json(&json!({ "name": "Odeon", "address": "1 High Street" }))
        .await
        .json();

    let response = server
        .post(v1::showtimes::COLLECTION)
        .json(&json!({
            "movie_id": movie["id"],
            "cinema_id": cinema["id"],
            "start_time": "2030-01-01T18:30:00Z",
            "ticket_price": "12.50",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    server
        .post(v1::showtimes::COLLECTION)
        .json(&json!({
            "movie_id": movie["id"],
            "cinema_id": cinema["id"],
            "start_time": "2030-01-01T21:00:00Z",
            "ticket_price": "-1",
        }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let listed: Value = server
        .get(v1::showtimes::COLLECTION)
        .add_query_param("cinema_id", cinema["id"].as_str().unwrap())
        .await
        .json();
    assert_eq!(listed["count"], 1);
}

#[tokio::test]
async fn api_requests_are_recorded_as_visits() {
    let (server, _state) = build_test_server();
    let user = create_user(&server, "grace").await;

    server
        .get(v1::genres::COLLECTION)
        .add_header("x-user-id", user.clone())
        .add_header("x-forwarded-for", "203.0.113.9")
        .await
        .assert_status_ok();

    let visits: Value = server.get(v1::visits::COLLECTION).await.json();
    let entries = visits["results"].as_array().unwrap();
    let genre_visit = entries
        .iter()
        .find(|visit| visit["path"] == v1::genres::COLLECTION)
        .expect("genre listing recorded");
    assert_eq!(genre_visit["user_id"], user.as_str());
    assert_eq!(genre_visit["ip_address"], "203.0.113.9");
    assert_eq!(genre_visit["method"], "GET");
}

#[tokio::test]
async fn health_reports_in_memory_storage() {
    let (server, _state) = build_test_server();
    let response = server.get(v1::system::HEALTH).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["database"], "in_memory");
    assert_eq!(body["status"], "healthy");

    server.get("/ping").await.assert_status_ok();
}
