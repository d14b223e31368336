use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use baize_tests::{spoof_config, spoof_pool, MemoryStore};

use crate::{routes::create_router, state::AppState};

fn seeded_app(player_count: usize) -> axum::Router {
    let store = MemoryStore::new();
    let players = spoof_pool("p", player_count, "C1");
    store.seed_tournament(spoof_config("T1", &players));
    store.seed_players(players);
    create_router(AppState::with_store(store))
}

async fn post_json(app: axum::Router, path: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn initialize_creates_the_first_round() {
    let (status, body) = post_json(
        seeded_app(4),
        "/api/algorithm/initialize-tournament",
        json!({"tournamentId": "T1"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["totalMatches"], json!(2));
    assert_eq!(body["matches"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_tournament_is_a_domain_failure_not_a_500() {
    let (status, body) = post_json(
        seeded_app(4),
        "/api/algorithm/initialize-tournament",
        json!({"tournamentId": "nope"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("NotFound"));
}

#[tokio::test]
async fn malformed_body_is_a_400() {
    let response = seeded_app(4)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/algorithm/initialize-tournament")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn next_round_requires_the_entity_id() {
    let (status, body) = post_json(
        seeded_app(4),
        "/api/algorithm/community/next-round",
        json!({"tournamentId": "T1"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("InvalidInput"));
}

#[tokio::test]
async fn test_connection_reports_the_store() {
    let response = seeded_app(1)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/algorithm/test-connection")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], json!(true));
}
