#![allow(dead_code)]

use axum::{body::Body, http::Request, response::Response, Router};
use gist_relay::config::{GistBackend, GithubConfig, RelayConfig, SharingConfig};
use gist_relay::services::InMemoryGistStore;
use gist_relay::startup::{build_router, AppState, Application};
use http_body_util::BodyExt;
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_TOKEN: &str = "ghp_test_token";

/// Config pointing both GitHub endpoints at `upstream` (a wiremock URI).
pub fn test_config(upstream: &str) -> RelayConfig {
    RelayConfig {
        common: CoreConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port for testing
        },
        github: GithubConfig {
            backend: GistBackend::Github,
            api_base_url: upstream.to_string(),
            raw_base_url: upstream.to_string(),
            user_agent: "gist-relay-tests".to_string(),
            request_timeout_secs: Some(5),
            token: Some(Secret::new(TEST_TOKEN.to_string())),
        },
        sharing: SharingConfig { allow_create: true },
    }
}

/// Router over an in-memory store, for driving handlers without a socket.
pub fn memory_router(store: InMemoryGistStore, allow_create: bool) -> Router {
    build_router(AppState::new(Arc::new(store), allow_create))
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(body.into())
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_string(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    /// Spawn the full application on a random port.
    pub async fn spawn(config: RelayConfig) -> Self {
        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        }

        TestApp { address, port }
    }

    pub fn api_url(&self) -> String {
        format!("{}/api", self.address)
    }
}
