//! Integration tests for schoolcal-api endpoints
//!
//! Drives the real router over an in-memory database:
//! - prompt issuance (specific and random-claim)
//! - data ingest create/merge semantics and validation ordering
//! - re-scrape candidate claiming
//! - the full dump endpoint

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot` method

use schoolcal_api::{build_router, AppState};
use schoolcal_common::db::{init_in_memory, queries};

async fn setup_pool() -> SqlitePool {
    init_in_memory().await.expect("in-memory database")
}

fn setup_app(db: SqlitePool) -> axum::Router {
    build_router(AppState::new(db))
}

async fn add_school(pool: &SqlitePool, urn: i64, name: &str, website: Option<&str>, process: bool) {
    queries::insert_school(pool, urn, name, "Camden", "Open", website, process)
        .await
        .expect("insert school");
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// ============================================================================
// Health endpoint
// ============================================================================

#[tokio::test]
async fn health_endpoint_reports_module() {
    let app = setup_app(setup_pool().await);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "schoolcal-api");
}

// ============================================================================
// Prompt endpoints
// ============================================================================

#[tokio::test]
async fn school_prompt_substitutes_website() {
    let pool = setup_pool().await;
    add_school(&pool, 100001, "Alpha Primary", Some("alpha.sch.uk"), false).await;
    let app = setup_app(pool);

    let response = app.oneshot(get("/api/schools/100001/prompt")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["school_id"], "100001");
    let prompt = body["prompt"].as_str().unwrap();
    assert!(prompt.contains("https://alpha.sch.uk"));
}

#[tokio::test]
async fn school_prompt_unknown_school_is_404() {
    let app = setup_app(setup_pool().await);

    let response = app.oneshot(get("/api/schools/999999/prompt")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("999999"));
}

#[tokio::test]
async fn random_prompt_claims_unprocessed_school() {
    let pool = setup_pool().await;
    add_school(&pool, 100001, "Alpha Primary", Some("alpha.sch.uk"), false).await;
    let app = setup_app(pool.clone());

    let response = app.oneshot(get("/api/schools/random/prompt")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["school_id"], "100001");

    let school = queries::get_school(&pool, 100001).await.unwrap().unwrap();
    assert!(school.process, "claimed school must be marked processed");
}

#[tokio::test]
async fn random_prompt_falls_back_when_all_processed() {
    let pool = setup_pool().await;
    add_school(&pool, 100001, "Alpha Primary", Some("alpha.sch.uk"), true).await;
    let app = setup_app(pool);

    let response = app.oneshot(get("/api/schools/random/prompt")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn random_prompt_with_no_schools_is_404() {
    let app = setup_app(setup_pool().await);

    let response = app.oneshot(get("/api/schools/random/prompt")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Data ingest
// ============================================================================

#[tokio::test]
async fn post_data_creates_then_merges() {
    let pool = setup_pool().await;
    add_school(&pool, 100001, "Alpha Primary", None, false).await;
    let app = setup_app(pool);

    let body = json!({"school_id": 100001, "data": {"a": 1, "b": 2}});
    let response = app
        .clone()
        .oneshot(post_json("/api/schools/data", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["action"], "created");
    assert_eq!(body["school_id"], "100001");

    // Shallow merge: incoming keys win, others are preserved
    let body = json!({"school_id": 100001, "data": {"b": 3, "c": 4}});
    let response = app
        .oneshot(post_json("/api/schools/data", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["action"], "updated");
    assert_eq!(body["data"], json!({"a": 1, "b": 3, "c": 4}));
}

#[tokio::test]
async fn post_data_validation_errors_in_order() {
    let pool = setup_pool().await;
    add_school(&pool, 100001, "Alpha Primary", None, false).await;
    let app = setup_app(pool);

    let request = Request::builder()
        .method("POST")
        .uri("/api/schools/data")
        .header("content-type", "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Invalid JSON in request body");

    let response = app
        .clone()
        .oneshot(post_json("/api/schools/data", &json!({"data": {}})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "school_id is required");

    let response = app
        .clone()
        .oneshot(post_json("/api/schools/data", &json!({"school_id": 100001})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "data is required");

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/schools/data",
            &json!({"school_id": 100001, "data": [1, 2]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "data must be a JSON object");

    let response = app
        .oneshot(post_json(
            "/api/schools/data",
            &json!({"school_id": 999999, "data": {}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn post_data_accepts_string_school_id() {
    let pool = setup_pool().await;
    add_school(&pool, 100001, "Alpha Primary", None, false).await;
    let app = setup_app(pool);

    let body = json!({"school_id": "100001", "data": {"k": "v"}});
    let response = app
        .oneshot(post_json("/api/schools/data", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

// ============================================================================
// Re-scrape candidate selection
// ============================================================================

#[tokio::test]
async fn invalid_data_claims_school_without_record() {
    let pool = setup_pool().await;
    add_school(&pool, 100001, "Alpha Primary", Some("alpha.sch.uk"), true).await;
    let app = setup_app(pool.clone());

    let response = app.oneshot(get("/api/schools/invalid-data")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["school_id"], "100001");
    assert_eq!(body["reason"], "no_data");

    let school = queries::get_school(&pool, 100001).await.unwrap().unwrap();
    assert!(school.second_scraper, "claimed school must be flagged");
}

#[tokio::test]
async fn invalid_data_reports_invalid_payload() {
    let pool = setup_pool().await;
    add_school(&pool, 100001, "Alpha Primary", Some("alpha.sch.uk"), true).await;
    queries::insert_record(&pool, 100001, &json!({"text": "no json here"}))
        .await
        .unwrap();
    let app = setup_app(pool);

    let response = app.oneshot(get("/api/schools/invalid-data")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["reason"], "invalid_data");
}

#[tokio::test]
async fn invalid_data_skips_calendar_shaped_payloads() {
    let pool = setup_pool().await;
    add_school(&pool, 100001, "Alpha Primary", Some("alpha.sch.uk"), true).await;
    queries::insert_record(
        &pool,
        100001,
        &json!({"school_name": "Alpha Primary", "terms": []}),
    )
    .await
    .unwrap();
    let app = setup_app(pool);

    let response = app.oneshot(get("/api/schools/invalid-data")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_data_is_claimed_at_most_once() {
    let pool = setup_pool().await;
    add_school(&pool, 100001, "Alpha Primary", Some("alpha.sch.uk"), true).await;
    let app = setup_app(pool);

    let response = app
        .clone()
        .oneshot(get("/api/schools/invalid-data"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The only candidate is now flagged; nothing left to hand out
    let response = app.oneshot(get("/api/schools/invalid-data")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Full dump
// ============================================================================

#[tokio::test]
async fn list_schools_joins_current_record() {
    let pool = setup_pool().await;
    add_school(&pool, 100001, "Alpha Primary", Some("alpha.sch.uk"), false).await;
    add_school(&pool, 100002, "Beta Academy", None, false).await;
    queries::insert_record(&pool, 100001, &json!({"stale": true}))
        .await
        .unwrap();
    queries::insert_record(&pool, 100001, &json!({"school_name": "Alpha", "terms": []}))
        .await
        .unwrap();
    let app = setup_app(pool);

    let response = app.oneshot(get("/api/schools")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_schools"], 2);

    // Display order is by establishment name; the joined payload must be
    // the most recent record, not the first
    let schools = body["schools"].as_array().unwrap();
    assert_eq!(schools[0]["urn"], 100001);
    assert_eq!(schools[0]["data"], json!({"school_name": "Alpha", "terms": []}));
    assert_eq!(schools[1]["urn"], 100002);
    assert_eq!(schools[1]["data"], Value::Null);
    assert_eq!(schools[1]["data_created_at"], Value::Null);
}
