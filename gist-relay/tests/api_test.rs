//! Handler behaviour of `/api` against the in-memory gist store.

mod common;

use axum::http::{header, StatusCode};
use common::{body_json, body_string, get, memory_router, post, send};
use gist_relay::services::gist::{GIST_DESCRIPTION, GIST_FILENAME};
use gist_relay::services::InMemoryGistStore;

#[tokio::test]
async fn get_without_id_is_bad_request() {
    let store = InMemoryGistStore::new();
    let app = memory_router(store.clone(), true);

    let response = send(&app, get("/api")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, "Missing `id` query field");
    assert_eq!(store.fetch_count(), 0);
}

#[tokio::test]
async fn get_with_empty_id_is_bad_request() {
    let store = InMemoryGistStore::new();
    let app = memory_router(store.clone(), true);

    let response = send(&app, get("/api?id=")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.fetch_count(), 0);
}

#[tokio::test]
async fn get_relays_stored_content() {
    let store = InMemoryGistStore::new();
    store.insert("abc123", "hello").await;
    let app = memory_router(store.clone(), true);

    let response = send(&app, get("/api?id=abc123")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "hello");
    assert_eq!(store.fetch_count(), 1);
}

#[tokio::test]
async fn get_with_repeated_id_uses_the_first() {
    let store = InMemoryGistStore::new();
    store.insert("a", "first").await;
    store.insert("b", "second").await;
    let app = memory_router(store.clone(), true);

    let response = send(&app, get("/api?id=a&id=b")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "first");
    assert_eq!(store.fetch_count(), 1);
}

#[tokio::test]
async fn get_ignores_unrelated_query_fields() {
    let store = InMemoryGistStore::new();
    store.insert("abc123", "hello").await;
    let app = memory_router(store.clone(), true);

    let response = send(&app, get("/api?theme=dark&id=abc123&id")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "hello");
}

#[tokio::test]
async fn get_with_empty_first_id_is_bad_request() {
    let store = InMemoryGistStore::new();
    store.insert("b", "second").await;
    let app = memory_router(store.clone(), true);

    let response = send(&app, get("/api?id=&id=b")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, "Missing `id` query field");
    assert_eq!(store.fetch_count(), 0);
}

#[tokio::test]
async fn get_unknown_id_is_not_found_naming_the_id() {
    let app = memory_router(InMemoryGistStore::new(), true);

    let response = send(&app, get("/api?id=doesnotexist")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_string(response).await.contains("doesnotexist"));
}

#[tokio::test]
async fn post_with_empty_body_is_bad_request() {
    let store = InMemoryGistStore::new();
    let app = memory_router(store.clone(), true);

    let response = send(&app, post("/api", "")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, "Missing body of POST request");
    assert_eq!(store.create_count(), 0);
}

#[tokio::test]
async fn post_creates_private_notebook_gist() {
    let app = memory_router(InMemoryGistStore::new(), true);

    let response = send(&app, post("/api", "x = 1")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );

    let gist = body_json(response).await;
    assert_eq!(gist["files"][GIST_FILENAME]["content"], "x = 1");
    assert_eq!(gist["public"], false);
    assert_eq!(gist["description"], GIST_DESCRIPTION);
    assert_eq!(gist["files"].as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn created_notebook_reads_back_unchanged() {
    let app = memory_router(InMemoryGistStore::new(), true);
    let notebook = "edge(x: 1, y: 2).\npath(x, y) :- edge(x, y).\n\n```js\nconsole.log(\"ü\");\n```";

    let created = body_json(send(&app, post("/api", notebook)).await).await;
    let id = created["id"].as_str().unwrap().to_string();

    let response = send(&app, get(&format!("/api?id={}", id))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, notebook);
}

#[tokio::test]
async fn create_failure_is_contained_to_the_request() {
    let store = InMemoryGistStore::failing_creates();
    store.insert("abc123", "still here").await;
    let app = memory_router(store, true);

    let response = send(&app, post("/api", "x = 1")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let error = body_json(response).await;
    assert!(error["error"].as_str().unwrap().contains("Failed to create a gist"));

    // The service keeps answering after an upstream failure.
    let response = send(&app, get("/api?id=abc123")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "still here");
}

#[tokio::test]
async fn post_is_not_routed_when_creation_disabled() {
    let store = InMemoryGistStore::new();
    let app = memory_router(store.clone(), false);

    let response = send(&app, post("/api", "x = 1")).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(store.create_count(), 0);
}

#[tokio::test]
async fn other_methods_are_rejected() {
    let app = memory_router(InMemoryGistStore::new(), true);

    let request = axum::http::Request::builder()
        .method("DELETE")
        .uri("/api?id=abc123")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let app = memory_router(InMemoryGistStore::new(), true);

    let request = axum::http::Request::builder()
        .uri("/api")
        .header("x-request-id", "req-42")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-42");
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
}

#[tokio::test]
async fn large_bodies_are_not_capped_by_the_relay() {
    let app = memory_router(InMemoryGistStore::new(), true);
    let notebook = "a".repeat(4 * 1024 * 1024);

    let response = send(&app, post("/api", notebook.clone())).await;

    assert_eq!(response.status(), StatusCode::OK);
    let gist = body_json(response).await;
    assert_eq!(
        gist["files"][GIST_FILENAME]["content"].as_str().unwrap().len(),
        notebook.len()
    );
}
