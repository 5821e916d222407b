//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint through the router.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use lru_cache_server::{
    api::create_router,
    cache::{CacheStore, ManualClock, SharedCache},
    AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app(capacity: usize) -> Router {
    let state = AppState::new(SharedCache::new(capacity).unwrap());
    create_router(state)
}

fn create_app_with_clock(capacity: usize) -> (Router, ManualClock) {
    let clock = ManualClock::new();
    let store = CacheStore::with_clock(capacity, Arc::new(clock.clone())).unwrap();
    let state = AppState::new(SharedCache::from_store(store));
    (create_router(state), clock)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post_cache(app: &Router, body: Value) -> StatusCode {
    post_raw(app, &body.to_string()).await.status()
}

async fn post_raw(app: &Router, body: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/cache")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get_cache(app: &Router, key: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/cache/{}", key))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

// == SET Endpoint Tests ==

#[tokio::test]
async fn test_set_endpoint_success() {
    let app = create_test_app(100);

    let response = post_raw(&app, r#"{"key":"test_key","value":"test_value","ttl":60}"#).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("test_key"));
    assert_eq!(json["key"], "test_key");
}

#[tokio::test]
async fn test_set_accepts_any_json_value() {
    let app = create_test_app(100);

    let status = post_cache(&app, json!({"key": "doc", "value": {"a": [1, 2, 3]}, "ttl": 0})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = get_cache(&app, "doc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], json!({"a": [1, 2, 3]}));
}

#[tokio::test]
async fn test_set_rejects_bad_input_with_400() {
    let app = create_test_app(100);

    let bodies = [
        r#"{"invalid json"#,
        r#"{"value":"no key","ttl":1}"#,
        r#"{"key":"k","value":"v","ttl":"ten"}"#,
        r#"{"key":"k","value":"v","ttl":2.5}"#,
        r#"{"key":"","value":"v","ttl":1}"#,
        r#"{"key":"k","value":"v","ttl":-1}"#,
    ];

    for body in bodies {
        let response = post_raw(&app, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
        let json = body_to_json(response.into_body()).await;
        assert!(json["error"].is_string(), "body: {}", body);
    }
}

#[tokio::test]
async fn test_set_without_content_type_is_400() {
    let app = create_test_app(100);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/cache")
                .body(Body::from(r#"{"key":"k","value":"v"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// == GET Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_success() {
    let app = create_test_app(100);

    let status = post_cache(&app, json!({"key": "get_key", "value": "get_value", "ttl": 0})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = get_cache(&app, "get_key").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], "get_value");
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app(100);

    let (status, json) = get_cache(&app, "nonexistent_key").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("not found"));
}

// == LRU Behavior via API ==

#[tokio::test]
async fn test_lru_scenario_via_api() {
    let app = create_test_app(2);

    post_cache(&app, json!({"key": "a", "value": 1, "ttl": 0})).await;
    post_cache(&app, json!({"key": "b", "value": 2, "ttl": 0})).await;
    let (status, json) = get_cache(&app, "a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], 1);
    post_cache(&app, json!({"key": "c", "value": 3, "ttl": 0})).await;

    assert_eq!(get_cache(&app, "b").await.0, StatusCode::NOT_FOUND);
    let (status, json) = get_cache(&app, "a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], 1);
    let (status, json) = get_cache(&app, "c").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], 3);
}

// == DELETE Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint() {
    let app = create_test_app(100);
    post_cache(&app, json!({"key": "delete_key", "value": "v"})).await;

    let delete = |key: &'static str| {
        app.clone().oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/cache/{}", key))
                .body(Body::empty())
                .unwrap(),
        )
    };

    assert_eq!(delete("delete_key").await.unwrap().status(), StatusCode::OK);
    assert_eq!(get_cache(&app, "delete_key").await.0, StatusCode::NOT_FOUND);
    assert_eq!(
        delete("delete_key").await.unwrap().status(),
        StatusCode::NOT_FOUND
    );
}

// == STATS Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint() {
    let app = create_test_app(1);

    post_cache(&app, json!({"key": "one", "value": 1})).await;
    post_cache(&app, json!({"key": "two", "value": 2})).await;
    get_cache(&app, "two").await;
    get_cache(&app, "one").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;

    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["evictions"], 1);
    assert_eq!(json["total_entries"], 1);
    assert_eq!(json["capacity"], 1);
    assert_eq!(json["hit_rate"], 0.5);
}

// == HEALTH Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(100);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

// == TTL Expiration via API Tests ==

#[tokio::test]
async fn test_ttl_expiration_via_api() {
    let (app, clock) = create_app_with_clock(100);

    let status = post_cache(&app, json!({"key": "ttl_test", "value": "expires_soon", "ttl": 1})).await;
    assert_eq!(status, StatusCode::OK);
    post_cache(&app, json!({"key": "forever", "value": "stays", "ttl": 0})).await;

    assert_eq!(get_cache(&app, "ttl_test").await.0, StatusCode::OK);

    clock.advance_secs(2);

    assert_eq!(get_cache(&app, "ttl_test").await.0, StatusCode::NOT_FOUND);
    assert_eq!(get_cache(&app, "forever").await.0, StatusCode::OK);
}
